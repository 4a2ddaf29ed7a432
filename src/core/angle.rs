//! Joint angle calculation from three landmarks.

use crate::models::pose::Landmark;

/// Unsigned angle in degrees at vertex `b` between rays b→a and b→c.
///
/// Only x/y are used; z and visibility are ignored. The result lies in
/// [0, 180] for any winding order. Coincident points are not trapped: the
/// result is whatever IEEE arithmetic produces (0 or NaN), which never
/// crosses a rep threshold.
pub fn angle_at(a: &Landmark, b: &Landmark, c: &Landmark) -> f64 {
    let (ax, ay) = (f64::from(a.x), f64::from(a.y));
    let (bx, by) = (f64::from(b.x), f64::from(b.y));
    let (cx, cy) = (f64::from(c.x), f64::from(c.y));

    let radians = (cy - by).atan2(cx - bx) - (ay - by).atan2(ax - bx);
    let degrees = radians.to_degrees().abs();

    if degrees > 180.0 {
        360.0 - degrees
    } else {
        degrees
    }
}
