//! Conversion of caller-provided coordinate and value sources into the fixed
//! `f32` layouts the renderer consumes.

use glam::{DVec3, Vec3};

/// Anything that can be read as a 3-component coordinate.
pub trait Point3Source {
    fn to_vec3(&self) -> Vec3;
}

impl Point3Source for Vec3 {
    fn to_vec3(&self) -> Vec3 {
        *self
    }
}

impl Point3Source for DVec3 {
    fn to_vec3(&self) -> Vec3 {
        self.as_vec3()
    }
}

impl Point3Source for [f32; 3] {
    fn to_vec3(&self) -> Vec3 {
        Vec3::from_array(*self)
    }
}

impl Point3Source for [f64; 3] {
    fn to_vec3(&self) -> Vec3 {
        DVec3::from_array(*self).as_vec3()
    }
}

impl Point3Source for (f32, f32, f32) {
    fn to_vec3(&self) -> Vec3 {
        Vec3::new(self.0, self.1, self.2)
    }
}

impl Point3Source for (f64, f64, f64) {
    fn to_vec3(&self) -> Vec3 {
        DVec3::new(self.0, self.1, self.2).as_vec3()
    }
}

impl<T: Point3Source + ?Sized> Point3Source for &T {
    fn to_vec3(&self) -> Vec3 {
        (**self).to_vec3()
    }
}

pub fn standardize_points<I>(source: I) -> Vec<Vec3>
where
    I: IntoIterator,
    I::Item: Point3Source,
{
    source.into_iter().map(|point| point.to_vec3()).collect()
}

pub fn standardize_scalars<I>(source: I) -> Vec<f32>
where
    I: IntoIterator,
    I::Item: Into<f64>,
{
    source
        .into_iter()
        .map(|value| value.into() as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_coordinate_layouts() {
        let expected = vec![Vec3::new(1.0, 2.0, 3.0), Vec3::new(-1.0, 0.5, 0.0)];

        let arrays = [[1.0f32, 2.0, 3.0], [-1.0, 0.5, 0.0]];
        assert_eq!(standardize_points(&arrays), expected);

        let doubles = vec![[1.0f64, 2.0, 3.0], [-1.0, 0.5, 0.0]];
        assert_eq!(standardize_points(doubles), expected);

        let tuples = [(1.0f32, 2.0f32, 3.0f32), (-1.0, 0.5, 0.0)];
        assert_eq!(standardize_points(tuples.iter()), expected);

        let dvecs = [DVec3::new(1.0, 2.0, 3.0), DVec3::new(-1.0, 0.5, 0.0)];
        assert_eq!(standardize_points(dvecs), expected);
    }

    #[test]
    fn scalars_narrow_to_f32() {
        assert_eq!(standardize_scalars([1u32, 2, 3]), vec![1.0, 2.0, 3.0]);
        assert_eq!(standardize_scalars(vec![0.5f64, -2.0]), vec![0.5, -2.0]);
    }
}
