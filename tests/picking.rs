use cloudscope::pick::{self, BACKGROUND_ID};
use cloudscope::{POINT_CLOUD_TYPE, PickHit, Scene, SceneConfig};
use glam::Vec3;

fn scene_with_clouds(sizes: &[usize]) -> Scene {
    let mut scene = Scene::new(SceneConfig::default()).expect("default config is valid");
    for (index, size) in sizes.iter().enumerate() {
        let points: Vec<Vec3> = (0..*size).map(|i| Vec3::splat(i as f32)).collect();
        scene
            .register_point_cloud(format!("cloud{index}"), points)
            .expect("unique name");
    }
    scene
}

#[test]
fn pick_ranges_never_overlap() {
    let scene = scene_with_clouds(&[5, 0, 3, 7]);
    let mut ranges: Vec<_> = (0..4)
        .filter_map(|index| {
            scene
                .point_cloud(Some(format!("cloud{index}").as_str()))
                .and_then(|cloud| cloud.pick_ids())
        })
        .filter(|range| !range.is_empty())
        .collect();
    ranges.sort_by_key(|range| range.start);

    assert_eq!(ranges.len(), 3);
    for pair in ranges.windows(2) {
        assert!(pair[0].end <= pair[1].start);
    }
    assert!(ranges.iter().all(|range| !range.contains(&BACKGROUND_ID)));
}

#[test]
fn pick_colors_recover_point_indices() {
    let scene = scene_with_clouds(&[4, 6]);
    let cloud = scene.point_cloud(Some("cloud1")).expect("registered");
    let start = cloud.pick_ids().expect("pick prepared").start;

    for (index, color) in cloud.pick_colors().expect("pick prepared").iter().enumerate() {
        let id = pick::color_to_id(*color);
        assert_eq!((id - start) as usize, index);
        assert_eq!(
            scene.resolve_pick(id),
            Some(PickHit {
                type_name: POINT_CLOUD_TYPE,
                name: "cloud1".to_string(),
                local_index: index,
            })
        );
    }
}

#[test]
fn released_ids_are_not_reused() {
    let mut scene = scene_with_clouds(&[3]);
    let old = scene
        .point_cloud(Some("cloud0"))
        .and_then(|cloud| cloud.pick_ids())
        .expect("pick prepared");
    assert!(scene.remove_structure(POINT_CLOUD_TYPE, "cloud0"));
    assert_eq!(scene.resolve_pick(old.start), None);

    scene
        .register_point_cloud("cloud0", vec![Vec3::ZERO; 3])
        .expect("name is free again");
    let new = scene
        .point_cloud(Some("cloud0"))
        .and_then(|cloud| cloud.pick_ids())
        .expect("pick prepared");
    assert!(new.start >= old.end);
}

#[test]
fn background_resolves_to_nothing() {
    let scene = scene_with_clouds(&[2]);
    assert_eq!(scene.resolve_pick(BACKGROUND_ID), None);
    assert_eq!(scene.resolve_pick_color(Vec3::ZERO), None);
}
