use crate::config::scenario::Scenario;
use crate::core::geometry::{self, Point};
use crate::domain::model::ReferenceElement;
use crate::utils::error::{Result, SimError};

/// Array probe: element centres plus a reference point used to place it.
#[derive(Debug, Clone)]
pub struct Probe {
    pub frequency: f64,
    pub numx: usize,
    pub numy: usize,
    pub pitch_x: f64,
    pub pitch_y: f64,
    pub locations: Vec<Point>,
    /// Local x axis of the probe, follows rotations.
    pub axis_x: Point,
    pub reference_point: Point,
}

impl Probe {
    /// Regular `numx` by `numy` array centred on the origin. Element `ix * numy + iy`
    /// sits at `((ix - (numx-1)/2) pitch_x, (iy - (numy-1)/2) pitch_y, 0)`.
    /// A pitch along a single-element axis is ignored and may be NaN.
    pub fn make_matrix_probe(
        numx: usize,
        pitch_x: f64,
        numy: usize,
        pitch_y: f64,
        frequency: f64,
    ) -> Result<Self> {
        if numx == 0 || numy == 0 {
            return Err(SimError::processing("a probe needs at least one element"));
        }
        let offset = |i: usize, n: usize, pitch: f64| {
            if n == 1 {
                0.0
            } else {
                (i as f64 - (n - 1) as f64 / 2.0) * pitch
            }
        };

        let mut locations = Vec::with_capacity(numx * numy);
        for ix in 0..numx {
            for iy in 0..numy {
                locations.push([offset(ix, numx, pitch_x), offset(iy, numy, pitch_y), 0.0]);
            }
        }

        Ok(Self {
            frequency,
            numx,
            numy,
            pitch_x,
            pitch_y,
            locations,
            axis_x: [1.0, 0.0, 0.0],
            reference_point: [0.0; 3],
        })
    }

    pub fn numelements(&self) -> usize {
        self.locations.len()
    }

    pub fn set_reference_element(&mut self, reference: ReferenceElement) {
        let first = self.locations[0];
        let last = self.locations[self.locations.len() - 1];
        self.reference_point = match reference {
            ReferenceElement::First => first,
            ReferenceElement::Last => last,
            ReferenceElement::Mean => geometry::centroid(&self.locations).unwrap_or(first),
            ReferenceElement::End => {
                let half_pitch = if self.numx > 1 { self.pitch_x / 2.0 } else { 0.0 };
                let a = self.axis_x;
                [
                    last[0] + half_pitch * a[0],
                    last[1] + half_pitch * a[1],
                    last[2] + half_pitch * a[2],
                ]
            }
        };
    }

    pub fn translate(&mut self, v: Point) {
        for loc in self.locations.iter_mut() {
            *loc = geometry::translate(loc, &v);
        }
        self.reference_point = geometry::translate(&self.reference_point, &v);
    }

    /// Move the probe so the reference point is at the origin.
    pub fn reset_position(&mut self) {
        let r = self.reference_point;
        self.translate([-r[0], -r[1], -r[2]]);
    }

    /// Rotate about the y axis through the reference point.
    pub fn rotate_y(&mut self, angle_rad: f64) {
        let r = self.reference_point;
        for loc in self.locations.iter_mut() {
            let local = [loc[0] - r[0], loc[1] - r[1], loc[2] - r[2]];
            *loc = geometry::translate(&geometry::rotate_y(&local, angle_rad), &r);
        }
        self.axis_x = geometry::rotate_y(&self.axis_x, angle_rad);
    }

    /// Build the probe of a scenario and put it in place: reference point at
    /// `(0, 0, standoff)`, tilted by `angle_deg` about y.
    pub fn from_scenario(scenario: &Scenario) -> Result<Self> {
        let config = &scenario.probe;
        let mut probe = Self::make_matrix_probe(
            config.numx,
            config.pitch_x,
            config.numy,
            config.pitch_y.unwrap_or(f64::NAN),
            config.frequency,
        )?;

        let location = &scenario.probe_location;
        probe.set_reference_element(location.ref_element);
        probe.reset_position();
        probe.rotate_y(location.angle_deg.to_radians());
        probe.translate([0.0, 0.0, location.standoff]);

        tracing::debug!(
            "Probe placed: {} elements, reference {:?} at {:?}",
            probe.numelements(),
            location.ref_element,
            probe.reference_point
        );
        Ok(probe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_point(a: Point, b: Point) {
        for i in 0..3 {
            assert!((a[i] - b[i]).abs() < 1e-12, "{:?} != {:?}", a, b);
        }
    }

    #[test]
    fn test_linear_probe_centred() {
        let probe = Probe::make_matrix_probe(5, 0.5e-3, 1, f64::NAN, 1e6).unwrap();
        assert_eq!(probe.numelements(), 5);
        assert_point(probe.locations[0], [-1e-3, 0.0, 0.0]);
        assert_point(probe.locations[2], [0.0, 0.0, 0.0]);
        assert_point(probe.locations[4], [1e-3, 0.0, 0.0]);
    }

    #[test]
    fn test_reference_first_then_translate() {
        let mut probe = Probe::make_matrix_probe(5, 0.5e-3, 1, f64::NAN, 1e6).unwrap();
        probe.set_reference_element(ReferenceElement::First);
        probe.reset_position();
        probe.translate([0.0, 0.0, -1e-3]);
        assert_point(probe.locations[0], [0.0, 0.0, -1e-3]);
        assert_point(probe.locations[4], [2e-3, 0.0, -1e-3]);
        assert_point(probe.reference_point, [0.0, 0.0, -1e-3]);
    }

    #[test]
    fn test_reference_end_and_last() {
        let mut probe = Probe::make_matrix_probe(4, 1e-3, 1, f64::NAN, 1e6).unwrap();
        probe.set_reference_element(ReferenceElement::Last);
        assert_point(probe.reference_point, [1.5e-3, 0.0, 0.0]);
        probe.set_reference_element(ReferenceElement::End);
        assert_point(probe.reference_point, [2e-3, 0.0, 0.0]);
        probe.set_reference_element(ReferenceElement::Mean);
        assert_point(probe.reference_point, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_matrix_probe_ordering() {
        let probe = Probe::make_matrix_probe(2, 1e-3, 3, 2e-3, 1e6).unwrap();
        assert_eq!(probe.numelements(), 6);
        assert_point(probe.locations[0], [-0.5e-3, -2e-3, 0.0]);
        assert_point(probe.locations[1], [-0.5e-3, 0.0, 0.0]);
        assert_point(probe.locations[3], [0.5e-3, -2e-3, 0.0]);
    }

    #[test]
    fn test_rotation_about_reference() {
        let mut probe = Probe::make_matrix_probe(3, 1e-3, 1, f64::NAN, 1e6).unwrap();
        probe.set_reference_element(ReferenceElement::First);
        probe.reset_position();
        probe.rotate_y(90f64.to_radians());
        assert_point(probe.locations[0], [0.0, 0.0, 0.0]);
        assert_point(probe.locations[2], [0.0, 0.0, -2e-3]);
    }

    #[test]
    fn test_empty_probe_is_rejected() {
        assert!(Probe::make_matrix_probe(0, 1e-3, 1, f64::NAN, 1e6).is_err());
    }

    fn scenario(ref_element: &str, angle_deg: f64) -> Scenario {
        let yaml = format!(
            r#"
probe: {{frequency: 1.e6, numx: 3, pitch_x: 1.e-3, numy: 1}}
probe_location: {{ref_element: {}, angle_deg: {}, standoff: -5.e-3}}
toneburst: {{num_cycles: 3}}
under_material: {{longitudinal_vel: 1480., state_of_matter: liquid}}
block_material: {{longitudinal_vel: 6300., transverse_vel: 3100., state_of_matter: solid}}
scatterer: {{location: {{x: 0., z: 5.e-3}}, specs: {{kind: point}}}}
frontwall: {{numpoints: 10, xmin: -5.e-3, xmax: 5.e-3, z: 0.}}
backwall: {{numpoints: 10, xmin: -5.e-3, xmax: 5.e-3, z: 10.e-3}}
grid: {{xmin: 0., xmax: 0., zmin: 5.e-3, zmax: 5.e-3, pixel_size: .nan}}
"#,
            ref_element, angle_deg
        );
        Scenario::from_yaml_str(&yaml).unwrap()
    }

    #[test]
    fn test_from_scenario_end_reference() {
        let probe = Probe::from_scenario(&scenario("end", 0.0)).unwrap();
        // outer edge of the last element sits at (0, 0, standoff)
        assert_point(probe.reference_point, [0.0, 0.0, -5e-3]);
        assert_point(probe.locations[0], [-2.5e-3, 0.0, -5e-3]);
        assert_point(probe.locations[2], [-0.5e-3, 0.0, -5e-3]);
    }

    #[test]
    fn test_from_scenario_tilted() {
        let probe = Probe::from_scenario(&scenario("end", 90.0)).unwrap();
        assert_point(probe.reference_point, [0.0, 0.0, -5e-3]);
        assert_point(probe.axis_x, [0.0, 0.0, -1.0]);
        assert_point(probe.locations[0], [0.0, 0.0, -2.5e-3]);
        assert_point(probe.locations[1], [0.0, 0.0, -3.5e-3]);
        assert_point(probe.locations[2], [0.0, 0.0, -4.5e-3]);

        let probe = Probe::from_scenario(&scenario("first", 30.0)).unwrap();
        let (s, c) = 30f64.to_radians().sin_cos();
        assert_point(probe.locations[0], [0.0, 0.0, -5e-3]);
        assert_point(probe.locations[2], [2e-3 * c, 0.0, -5e-3 - 2e-3 * s]);
    }
}
