use cloudscope::{DataType, SceneConfig, SceneError, state};
use glam::DVec3;

// Single test: the scene is process-wide.
#[test]
fn scene_lifecycle_through_global_state() {
    assert!(!state::is_initialized());
    assert!(matches!(
        state::register_point_cloud("early", vec![[0.0_f32; 3]]),
        Err(SceneError::NotInitialized)
    ));

    state::init(SceneConfig::default()).expect("first init");
    assert!(matches!(
        state::init(SceneConfig::default()),
        Err(SceneError::AlreadyInitialized)
    ));

    state::register_point_cloud("a", vec![DVec3::new(0.0, 0.0, 0.0), DVec3::new(1.0, 1.0, 1.0)])
        .expect("register a");
    state::register_point_cloud("b", vec![(2.0_f64, 0.0, 0.0)]).expect("register b");
    assert!(state::register_point_cloud("b", vec![(5.0_f64, 0.0, 0.0)]).is_err());

    let latest = state::with_point_cloud(None, |cloud| cloud.name().to_string())
        .expect("a cloud exists");
    assert_eq!(latest, "b");

    state::with_point_cloud(Some("a"), |cloud| {
        cloud.add_scalar_quantity("w", [1.0_f32, 2.0], DataType::Standard)
    })
    .expect("cloud a exists")
    .expect("sizes match");

    let missing = state::with_point_cloud(Some("zzz"), |_| ());
    assert!(matches!(missing, Err(SceneError::Registry(_))));

    let drawn = state::with_scene(|scene| scene.draw()).expect("initialized");
    assert!(drawn.is_ok());

    assert!(state::shutdown());
    assert!(!state::shutdown());
    assert!(!state::is_initialized());
}
