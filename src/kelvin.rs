use crate::color::Rgb;

pub const MIN_KELVIN: u32 = 1000;
pub const MAX_KELVIN: u32 = 40000;
const STEP: u32 = 100;

/// Blackbody white points from `MIN_KELVIN` to `MAX_KELVIN` in `STEP` increments.
/// Values follow Tanner Helland's fit of Mitchell Charity's blackbody table.
#[rustfmt::skip]
const TABLE: [[u8; 3]; 391] = [
    [255, 68, 0], [255, 77, 0], [255, 86, 0], [255, 94, 0], [255, 101, 0], // 1000K
    [255, 108, 0], [255, 115, 0], [255, 121, 0], [255, 126, 0], [255, 132, 0], // 1500K
    [255, 137, 14], [255, 142, 27], [255, 146, 39], [255, 151, 50], [255, 155, 61], // 2000K
    [255, 159, 70], [255, 163, 79], [255, 167, 87], [255, 170, 95], [255, 174, 103], // 2500K
    [255, 177, 110], [255, 180, 117], [255, 184, 123], [255, 187, 129], [255, 190, 135], // 3000K
    [255, 193, 141], [255, 195, 146], [255, 198, 151], [255, 201, 157], [255, 203, 161], // 3500K
    [255, 206, 166], [255, 208, 171], [255, 211, 175], [255, 213, 179], [255, 215, 183], // 4000K
    [255, 218, 187], [255, 220, 191], [255, 222, 195], [255, 224, 199], [255, 226, 202], // 4500K
    [255, 228, 206], [255, 230, 209], [255, 232, 213], [255, 234, 216], [255, 236, 219], // 5000K
    [255, 237, 222], [255, 239, 225], [255, 241, 228], [255, 243, 231], [255, 244, 234], // 5500K
    [255, 246, 237], [255, 248, 240], [255, 249, 242], [255, 251, 245], [255, 253, 248], // 6000K
    [255, 254, 250], [255, 255, 255], [254, 249, 255], [250, 246, 255], [246, 244, 255], // 6500K
    [243, 242, 255], [240, 240, 255], [237, 239, 255], [234, 237, 255], [232, 236, 255], // 7000K
    [230, 235, 255], [228, 234, 255], [226, 233, 255], [224, 232, 255], [223, 231, 255], // 7500K
    [221, 230, 255], [220, 229, 255], [218, 228, 255], [217, 227, 255], [216, 227, 255], // 8000K
    [215, 226, 255], [214, 225, 255], [213, 225, 255], [212, 224, 255], [211, 223, 255], // 8500K
    [210, 223, 255], [209, 222, 255], [208, 222, 255], [207, 221, 255], [206, 221, 255], // 9000K
    [205, 220, 255], [205, 220, 255], [204, 219, 255], [203, 219, 255], [202, 218, 255], // 9500K
    [202, 218, 255], [201, 218, 255], [200, 217, 255], [200, 217, 255], [199, 217, 255], // 10000K
    [199, 216, 255], [198, 216, 255], [197, 215, 255], [197, 215, 255], [196, 215, 255], // 10500K
    [196, 214, 255], [195, 214, 255], [195, 214, 255], [194, 213, 255], [194, 213, 255], // 11000K
    [193, 213, 255], [193, 213, 255], [192, 212, 255], [192, 212, 255], [192, 212, 255], // 11500K
    [191, 211, 255], [191, 211, 255], [190, 211, 255], [190, 211, 255], [189, 210, 255], // 12000K
    [189, 210, 255], [189, 210, 255], [188, 210, 255], [188, 210, 255], [188, 209, 255], // 12500K
    [187, 209, 255], [187, 209, 255], [187, 209, 255], [186, 208, 255], [186, 208, 255], // 13000K
    [186, 208, 255], [185, 208, 255], [185, 208, 255], [185, 207, 255], [184, 207, 255], // 13500K
    [184, 207, 255], [184, 207, 255], [183, 207, 255], [183, 206, 255], [183, 206, 255], // 14000K
    [182, 206, 255], [182, 206, 255], [182, 206, 255], [182, 205, 255], [181, 205, 255], // 14500K
    [181, 205, 255], [181, 205, 255], [181, 205, 255], [180, 205, 255], [180, 204, 255], // 15000K
    [180, 204, 255], [180, 204, 255], [179, 204, 255], [179, 204, 255], [179, 204, 255], // 15500K
    [179, 203, 255], [178, 203, 255], [178, 203, 255], [178, 203, 255], [178, 203, 255], // 16000K
    [177, 203, 255], [177, 203, 255], [177, 202, 255], [177, 202, 255], [176, 202, 255], // 16500K
    [176, 202, 255], [176, 202, 255], [176, 202, 255], [176, 202, 255], [175, 201, 255], // 17000K
    [175, 201, 255], [175, 201, 255], [175, 201, 255], [175, 201, 255], [174, 201, 255], // 17500K
    [174, 201, 255], [174, 201, 255], [174, 200, 255], [174, 200, 255], [173, 200, 255], // 18000K
    [173, 200, 255], [173, 200, 255], [173, 200, 255], [173, 200, 255], [173, 200, 255], // 18500K
    [172, 199, 255], [172, 199, 255], [172, 199, 255], [172, 199, 255], [172, 199, 255], // 19000K
    [172, 199, 255], [171, 199, 255], [171, 199, 255], [171, 199, 255], [171, 198, 255], // 19500K
    [171, 198, 255], [171, 198, 255], [170, 198, 255], [170, 198, 255], [170, 198, 255], // 20000K
    [170, 198, 255], [170, 198, 255], [170, 198, 255], [169, 198, 255], [169, 197, 255], // 20500K
    [169, 197, 255], [169, 197, 255], [169, 197, 255], [169, 197, 255], [169, 197, 255], // 21000K
    [168, 197, 255], [168, 197, 255], [168, 197, 255], [168, 197, 255], [168, 196, 255], // 21500K
    [168, 196, 255], [168, 196, 255], [167, 196, 255], [167, 196, 255], [167, 196, 255], // 22000K
    [167, 196, 255], [167, 196, 255], [167, 196, 255], [167, 196, 255], [166, 196, 255], // 22500K
    [166, 195, 255], [166, 195, 255], [166, 195, 255], [166, 195, 255], [166, 195, 255], // 23000K
    [166, 195, 255], [166, 195, 255], [165, 195, 255], [165, 195, 255], [165, 195, 255], // 23500K
    [165, 195, 255], [165, 195, 255], [165, 194, 255], [165, 194, 255], [165, 194, 255], // 24000K
    [164, 194, 255], [164, 194, 255], [164, 194, 255], [164, 194, 255], [164, 194, 255], // 24500K
    [164, 194, 255], [164, 194, 255], [164, 194, 255], [164, 194, 255], [163, 194, 255], // 25000K
    [163, 193, 255], [163, 193, 255], [163, 193, 255], [163, 193, 255], [163, 193, 255], // 25500K
    [163, 193, 255], [163, 193, 255], [163, 193, 255], [162, 193, 255], [162, 193, 255], // 26000K
    [162, 193, 255], [162, 193, 255], [162, 193, 255], [162, 193, 255], [162, 192, 255], // 26500K
    [162, 192, 255], [162, 192, 255], [162, 192, 255], [161, 192, 255], [161, 192, 255], // 27000K
    [161, 192, 255], [161, 192, 255], [161, 192, 255], [161, 192, 255], [161, 192, 255], // 27500K
    [161, 192, 255], [161, 192, 255], [161, 192, 255], [160, 192, 255], [160, 191, 255], // 28000K
    [160, 191, 255], [160, 191, 255], [160, 191, 255], [160, 191, 255], [160, 191, 255], // 28500K
    [160, 191, 255], [160, 191, 255], [160, 191, 255], [160, 191, 255], [159, 191, 255], // 29000K
    [159, 191, 255], [159, 191, 255], [159, 191, 255], [159, 191, 255], [159, 191, 255], // 29500K
    [159, 190, 255], [159, 190, 255], [159, 190, 255], [159, 190, 255], [159, 190, 255], // 30000K
    [158, 190, 255], [158, 190, 255], [158, 190, 255], [158, 190, 255], [158, 190, 255], // 30500K
    [158, 190, 255], [158, 190, 255], [158, 190, 255], [158, 190, 255], [158, 190, 255], // 31000K
    [158, 190, 255], [158, 190, 255], [157, 189, 255], [157, 189, 255], [157, 189, 255], // 31500K
    [157, 189, 255], [157, 189, 255], [157, 189, 255], [157, 189, 255], [157, 189, 255], // 32000K
    [157, 189, 255], [157, 189, 255], [157, 189, 255], [157, 189, 255], [156, 189, 255], // 32500K
    [156, 189, 255], [156, 189, 255], [156, 189, 255], [156, 189, 255], [156, 189, 255], // 33000K
    [156, 189, 255], [156, 188, 255], [156, 188, 255], [156, 188, 255], [156, 188, 255], // 33500K
    [156, 188, 255], [156, 188, 255], [156, 188, 255], [155, 188, 255], [155, 188, 255], // 34000K
    [155, 188, 255], [155, 188, 255], [155, 188, 255], [155, 188, 255], [155, 188, 255], // 34500K
    [155, 188, 255], [155, 188, 255], [155, 188, 255], [155, 188, 255], [155, 188, 255], // 35000K
    [155, 188, 255], [155, 187, 255], [154, 187, 255], [154, 187, 255], [154, 187, 255], // 35500K
    [154, 187, 255], [154, 187, 255], [154, 187, 255], [154, 187, 255], [154, 187, 255], // 36000K
    [154, 187, 255], [154, 187, 255], [154, 187, 255], [154, 187, 255], [154, 187, 255], // 36500K
    [154, 187, 255], [153, 187, 255], [153, 187, 255], [153, 187, 255], [153, 187, 255], // 37000K
    [153, 187, 255], [153, 187, 255], [153, 187, 255], [153, 186, 255], [153, 186, 255], // 37500K
    [153, 186, 255], [153, 186, 255], [153, 186, 255], [153, 186, 255], [153, 186, 255], // 38000K
    [153, 186, 255], [153, 186, 255], [152, 186, 255], [152, 186, 255], [152, 186, 255], // 38500K
    [152, 186, 255], [152, 186, 255], [152, 186, 255], [152, 186, 255], [152, 186, 255], // 39000K
    [152, 186, 255], [152, 186, 255], [152, 186, 255], [152, 186, 255], [152, 186, 255], // 39500K
    [152, 186, 255], // 40000K
];

/// Approximate white point for `kelvin`, clamped to the tabulated range and
/// linearly interpolated between neighbouring samples.
pub fn rgb_from_kelvin(kelvin: u32) -> Rgb {
    let clamped = kelvin.clamp(MIN_KELVIN, MAX_KELVIN);
    if clamped != kelvin {
        log::debug!("temperature {kelvin}K clamped to {clamped}K");
    }
    let offset = clamped - MIN_KELVIN;
    let index = (offset / STEP) as usize;
    let frac = (offset % STEP) as i32;

    let lo = TABLE[index];
    let Some(hi) = TABLE.get(index + 1) else {
        return Rgb::new(lo[0], lo[1], lo[2]);
    };
    let mix = |c: usize| {
        let (a, b) = (lo[c] as i32, hi[c] as i32);
        (a + (b - a) * frac / STEP as i32) as u8
    };
    Rgb::new(mix(0), mix(1), mix(2))
}
