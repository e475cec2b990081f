//! Normalized (UV) coordinate entry points.
//!
//! UV input is scaled by [`Config::unit_scale`](polynest_core::Config) into
//! the fixed-point space the library works in.

use crate::nester::Nester;
use polynest_core::geometry::IntPoint;
use polynest_core::{Affine2, Error, Handle, Result};

impl Nester {
    /// Like [`Nester::add_polygons`], with points and miter distance in UV space.
    pub fn add_uv_polygons(
        &mut self,
        points: &[(f64, f64)],
        triangles: &[usize],
        miter_distance: f64,
    ) -> Result<Vec<Handle>> {
        let unit = self.config().unit_scale;
        let scaled: Vec<IntPoint> = points
            .iter()
            .map(|&(u, v)| IntPoint::from_f64(u * unit, v * unit))
            .collect();
        self.add_polygons(&scaled, triangles, miter_distance * unit)
    }

    /// Maps each UV point through the current transform of the entry at the
    /// same position in `handles`.
    pub fn apply_transform_lib_uv_space(
        &self,
        points: &[(f64, f64)],
        handles: &[Handle],
    ) -> Result<Vec<(f64, f64)>> {
        self.map_uv(points, handles, |t| Ok(*t))
    }

    /// Inverse of [`Nester::apply_transform_lib_uv_space`].
    pub fn revert_transform_lib_uv_space(
        &self,
        points: &[(f64, f64)],
        handles: &[Handle],
    ) -> Result<Vec<(f64, f64)>> {
        self.map_uv(points, handles, |t| {
            t.inverse()
                .ok_or_else(|| Error::InvalidGeometry("transform is not invertible".into()))
        })
    }

    fn map_uv<F>(&self, points: &[(f64, f64)], handles: &[Handle], select: F) -> Result<Vec<(f64, f64)>>
    where
        F: Fn(&Affine2) -> Result<Affine2>,
    {
        if points.len() != handles.len() {
            return Err(Error::InvalidGeometry(format!(
                "{} points but {} handles",
                points.len(),
                handles.len()
            )));
        }
        let unit = self.config().unit_scale;
        let transforms = self.transforms(handles)?;
        points
            .iter()
            .zip(transforms.iter())
            .map(|(&(u, v), t)| {
                let t = select(t)?;
                let (x, y) = t.apply(u * unit, v * unit);
                Ok((x / unit, y / unit))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::Nester;
    use approx::assert_relative_eq;
    use polynest_core::Config;

    fn unit_square() -> (Vec<(f64, f64)>, Vec<usize>) {
        (
            vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)],
            vec![0, 1, 2, 0, 2, 3],
        )
    }

    #[test]
    fn test_add_uv_polygons_scales_by_unit() {
        let mut nester = Nester::with_config(Config::new().with_unit_scale(1000.0));
        let (pts, tris) = unit_square();
        let h = nester.add_uv_polygons(&pts, &tris, 0.0).unwrap()[0];
        let poly = nester.transformed_poly(h).unwrap();
        let b = polynest_core::geometry::set_bounds(&poly).unwrap();
        assert_eq!(b, polynest_core::IntRect::new(0, 0, 1000, 1000));
    }

    #[test]
    fn test_uv_round_trip() {
        let mut nester = Nester::with_config(Config::new().with_unit_scale(1000.0));
        let (pts, tris) = unit_square();
        let h = nester.add_uv_polygons(&pts, &tris, 0.0).unwrap()[0];
        nester.rotate(h, 0.7).translate(h, 250.0, -40.0).scale(h, 2.0, 0.5);
        nester.execute_blocking().unwrap();

        let query = [(0.25, 0.5), (1.0, 1.0)];
        let moved = nester.apply_transform_lib_uv_space(&query, &[h, h]).unwrap();
        let back = nester.revert_transform_lib_uv_space(&moved, &[h, h]).unwrap();
        for (a, b) in query.iter().zip(back.iter()) {
            assert_relative_eq!(a.0, b.0, epsilon = 1e-9);
            assert_relative_eq!(a.1, b.1, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_uv_translation_in_uv_units() {
        let mut nester = Nester::with_config(Config::new().with_unit_scale(1000.0));
        let (pts, tris) = unit_square();
        let h = nester.add_uv_polygons(&pts, &tris, 0.0).unwrap()[0];
        nester.translate(h, 500.0, 0.0);
        nester.execute_blocking().unwrap();
        let moved = nester.apply_transform_lib_uv_space(&[(0.0, 0.0)], &[h]).unwrap();
        assert_relative_eq!(moved[0].0, 0.5);
        assert_relative_eq!(moved[0].1, 0.0);
    }

    #[test]
    fn test_uv_errors() {
        let mut nester = Nester::new();
        let (pts, tris) = unit_square();
        let h = nester.add_uv_polygons(&pts, &tris, 0.0).unwrap()[0];
        assert!(nester
            .apply_transform_lib_uv_space(&[(0.0, 0.0)], &[h, h])
            .is_err());
        assert!(nester
            .apply_transform_lib_uv_space(&[(0.0, 0.0)], &[h + 1])
            .is_err());

        nester.scale(h, 0.0, 1.0);
        nester.execute_blocking().unwrap();
        assert!(nester
            .revert_transform_lib_uv_space(&[(0.0, 0.0)], &[h])
            .is_err());
    }
}
