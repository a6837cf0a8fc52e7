use crate::gamma::GammaRamp;

/// Writes the ramp `elapsed / total` of the way from `start` to `end` into `out`.
///
/// `elapsed` is clamped to `total`, so the final frame is `end` exactly.
/// A zero `total` yields `end`.
pub fn lerp(start: &GammaRamp, end: &GammaRamp, out: &mut GammaRamp, elapsed: u64, total: u64) {
    let (elapsed, total) = if total == 0 {
        (1, 1)
    } else {
        (elapsed.min(total) as i128, total as i128)
    };
    for ((o, s), e) in out
        .channels_mut()
        .into_iter()
        .zip(start.channels())
        .zip(end.channels())
    {
        for ((o, &s), &e) in o.iter_mut().zip(s).zip(e) {
            let (s, e) = (s as i128, e as i128);
            *o = (s + (e - s) * elapsed / total) as u16;
        }
    }
}
