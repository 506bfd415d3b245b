//! TIFF reading/writing via the `tiff` crate
//!
//! Handles 8-bit chunky images with 1, 3 or 4 samples per pixel, which is
//! what the Process API returns for UINT8 evalscript outputs. Georeferencing
//! is carried in the ModelPixelScale and ModelTiepoint tags, the CRS in the
//! GeoKeyDirectory.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster};
use std::io::{Cursor, Read, Seek, Write};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{self, ColorType as EncoderColorType};
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;
use tiff::ColorType;

// GeoKey ids
const GT_MODEL_TYPE: u16 = 1024;
const GT_RASTER_TYPE: u16 = 1025;
const GEOGRAPHIC_TYPE: u16 = 2048;
const PROJECTED_CS_TYPE: u16 = 3072;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;

/// Decode an in-memory TIFF into a Raster
pub fn decode_tiff(data: &[u8]) -> Result<Raster> {
    decode_from(Cursor::new(data))
}

/// Encode a Raster as TIFF into a byte buffer
pub fn encode_tiff(raster: &Raster) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let writer = Cursor::new(&mut buf);
    match raster.bands() {
        1 => encode_into::<colortype::Gray8, _>(raster, writer)?,
        3 => encode_into::<colortype::RGB8, _>(raster, writer)?,
        4 => encode_into::<colortype::RGBA8, _>(raster, writer)?,
        n => {
            return Err(Error::UnsupportedDataType(format!(
                "cannot write {}-band raster as TIFF",
                n
            )))
        }
    }
    Ok(buf)
}

fn decode_from<R: Read + Seek>(reader: R) -> Result<Raster> {
    let mut decoder = Decoder::new(reader)?;

    let (width, height) = decoder.dimensions()?;
    let rows = height as usize;
    let cols = width as usize;

    let bands = match decoder.colortype()? {
        ColorType::Gray(8) => 1,
        ColorType::GrayA(8) => 2,
        ColorType::RGB(8) => 3,
        ColorType::RGBA(8) | ColorType::CMYK(8) => 4,
        other => {
            return Err(Error::UnsupportedDataType(format!(
                "TIFF color type {:?}",
                other
            )))
        }
    };

    let samples = match decoder.read_image()? {
        DecodingResult::U8(buf) => buf,
        _ => {
            return Err(Error::UnsupportedDataType(
                "TIFF samples are not 8-bit unsigned".to_string(),
            ))
        }
    };

    let mut raster = Raster::from_vec(samples, rows, cols, bands)?;

    if let Ok(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
        raster.set_crs(read_crs(&mut decoder));
    }

    Ok(raster)
}

fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<GeoTransform> {
    let scale = decoder
        .get_tag_f64_vec(Tag::ModelPixelScaleTag)
        .map_err(|_| Error::Other("No pixel scale tag".into()))?;
    let tiepoint = decoder
        .get_tag_f64_vec(Tag::ModelTiepointTag)
        .map_err(|_| Error::Other("No tiepoint tag".into()))?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return Err(Error::Other("Cannot determine geotransform".into()));
    }

    // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
    Ok(GeoTransform::new(
        tiepoint[3] - tiepoint[0] * scale[0],
        tiepoint[4] + tiepoint[1] * scale[1],
        scale[0],
        -scale[1],
    ))
}

/// CRS from ProjectedCSTypeGeoKey or GeographicTypeGeoKey.
///
/// A geographic model type without an explicit code is taken as WGS84.
fn read_crs<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<CRS> {
    let keys = decoder.get_tag_u16_vec(Tag::GeoKeyDirectoryTag).ok()?;
    if keys.len() < 4 {
        return None;
    }

    let mut model_type = None;
    let mut geographic = None;
    let mut projected = None;

    // [version, revision, minor, count] then (id, location, count, value)
    for entry in keys[4..].chunks_exact(4).take(keys[3] as usize) {
        // location 0 means the value is stored inline
        if entry[1] != 0 {
            continue;
        }
        match entry[0] {
            GT_MODEL_TYPE => model_type = Some(entry[3]),
            GEOGRAPHIC_TYPE if entry[3] > 0 => geographic = Some(entry[3]),
            PROJECTED_CS_TYPE if entry[3] > 0 => projected = Some(entry[3]),
            _ => {}
        }
    }

    projected
        .or(geographic)
        .map(|code| CRS::from_epsg(code as u32))
        .or_else(|| (model_type == Some(MODEL_TYPE_GEOGRAPHIC)).then(CRS::wgs84))
}

/// GeoKeyDirectory for `crs`, PixelIsArea only when there is none.
fn geokey_directory(crs: Option<&CRS>) -> Vec<u16> {
    let mut entries: Vec<[u16; 4]> = Vec::new();

    // Codes that do not fit a SHORT value are left out.
    match crs.and_then(|c| u16::try_from(c.epsg()).ok().map(|code| (c, code))) {
        Some((c, code)) if c.is_geographic() => {
            entries.push([GT_MODEL_TYPE, 0, 1, MODEL_TYPE_GEOGRAPHIC]);
            entries.push([GT_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA]);
            entries.push([GEOGRAPHIC_TYPE, 0, 1, code]);
        }
        Some((_, code)) => {
            entries.push([GT_MODEL_TYPE, 0, 1, MODEL_TYPE_PROJECTED]);
            entries.push([GT_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA]);
            entries.push([PROJECTED_CS_TYPE, 0, 1, code]);
        }
        None => entries.push([GT_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA]),
    }

    // Version 1.1.0
    let mut keys = vec![1, 1, 0, entries.len() as u16];
    keys.extend(entries.into_iter().flatten());
    keys
}

fn encode_into<C, W>(raster: &Raster, writer: W) -> Result<()>
where
    C: EncoderColorType<Inner = u8>,
    W: Write + Seek,
{
    let mut encoder = TiffEncoder::new(writer)?;
    let mut image = encoder.new_image::<C>(raster.cols() as u32, raster.rows() as u32)?;

    let gt = raster.transform();
    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    image
        .encoder()
        .write_tag(Tag::ModelPixelScaleTag, &scale[..])?;
    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(Tag::ModelTiepointTag, &tiepoint[..])?;

    let geokeys = geokey_directory(raster.crs());
    image
        .encoder()
        .write_tag(Tag::GeoKeyDirectoryTag, &geokeys[..])?;

    image.write_data(&raster.to_interleaved())?;
    Ok(())
}
