//! Server-side evaluation scripts.

/// Sentinel-2 true color: B04, B03, B02 as red, green, blue.
pub const TRUE_COLOR: &str = r#"//VERSION=3
function setup() {
    return {
        input: [{ bands: ["B02", "B03", "B04"] }],
        output: { bands: 3 }
    };
}
function evaluatePixel(sample) {
    return [sample.B04, sample.B03, sample.B02];
}
"#;

/// NDVI rendered through a white-black-green ramp over [-1, 1], with the
/// data mask appended as a fourth band.
///
/// Dense vegetation maps to pure green, so its green intensity drops as the
/// index climbs from 0.5 to 1.
pub const NDVI_COLOR: &str = r#"//VERSION=3
function setup() {
    return {
        input: [{ bands: ["B04", "B08", "dataMask"] }],
        output: { bands: 4 }
    };
}

const whiteGreen = [
    [1.000, 0xFFFFFF],
    [0.500, 0x000000],
    [0.000, 0x00FF00]
];

let viz = new ColorGradientVisualizer(whiteGreen, -1.0, 1.0);

function evaluatePixel(samples) {
    let sum = samples.B08 + samples.B04;
    let ndvi = (sum == 0) ? 0 : (samples.B08 - samples.B04) / sum;
    let val = viz.process(ndvi);
    val.push(samples.dataMask);
    return val;
}
"#;

/// Script sent with a Process API request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evalscript {
    TrueColor,
    NdviColor,
    Custom(String),
}

impl Evalscript {
    pub fn source(&self) -> &str {
        match self {
            Self::TrueColor => TRUE_COLOR,
            Self::NdviColor => NDVI_COLOR,
            Self::Custom(src) => src,
        }
    }
}

impl From<String> for Evalscript {
    fn from(src: String) -> Self {
        Self::Custom(src)
    }
}
