//! Export options and the output blob handed to the host.

use crate::error::{RenderError, RenderResult};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use lc_core::model::ExportFormat;
use serde::{Deserialize, Serialize};

/// Device pixel ratio applied to the document's logical size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PixelRatio {
    #[default]
    #[serde(rename = "1x")]
    X1,
    #[serde(rename = "2x")]
    X2,
    #[serde(rename = "4x")]
    X4,
}

impl PixelRatio {
    pub fn value(&self) -> u32 {
        match self {
            PixelRatio::X1 => 1,
            PixelRatio::X2 => 2,
            PixelRatio::X4 => 4,
        }
    }

    pub fn from_value(v: u32) -> Option<Self> {
        match v {
            1 => Some(PixelRatio::X1),
            2 => Some(PixelRatio::X2),
            4 => Some(PixelRatio::X4),
            _ => None,
        }
    }
}

/// Ratio used for the single capture retry.
pub fn reduced_ratio(ratio: u32) -> u32 {
    ratio.saturating_sub(1).max(1)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
    pub format: ExportFormat,
    /// 0.1 – 1.0, lossy formats only.
    pub quality: f32,
    pub pixel_ratio: PixelRatio,
    /// Prefix of the download filename.
    pub app_name: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            quality: lc_core::model::DEFAULT_EXPORT_QUALITY,
            pixel_ratio: PixelRatio::X1,
            app_name: "layercraft".into(),
        }
    }
}

impl ExportOptions {
    pub fn filename(&self) -> String {
        format!("{}-export.{}", self.app_name, self.format.extension())
    }

    /// Output size in device pixels for a logical canvas size.
    pub fn output_size(&self, logical: (f32, f32), ratio: u32) -> (u32, u32) {
        let r = ratio as f32;
        (
            (logical.0 * r).round().max(1.0) as u32,
            (logical.1 * r).round().max(1.0) as u32,
        )
    }
}

/// Encoded image data as produced by a surface or capture collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportPayload {
    Bytes(Vec<u8>),
    DataUrl(String),
}

/// A finished export: a named, typed blob.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportBlob {
    pub filename: String,
    pub mime: &'static str,
    pub payload: ExportPayload,
}

impl ExportBlob {
    pub fn new(options: &ExportOptions, payload: ExportPayload) -> Self {
        Self {
            filename: options.filename(),
            mime: options.format.mime(),
            payload,
        }
    }

    /// `data:<mime>;base64,…`, re-using a data url payload as is.
    pub fn to_data_url(&self) -> String {
        match &self.payload {
            ExportPayload::DataUrl(url) => url.clone(),
            ExportPayload::Bytes(bytes) => {
                format!("data:{};base64,{}", self.mime, STANDARD.encode(bytes))
            }
        }
    }

    /// Raw encoded bytes, decoding a base64 data url payload if needed.
    pub fn to_bytes(&self) -> RenderResult<Vec<u8>> {
        match &self.payload {
            ExportPayload::Bytes(bytes) => Ok(bytes.clone()),
            ExportPayload::DataUrl(url) => decode_data_url(url),
        }
    }
}

fn decode_data_url(url: &str) -> RenderResult<Vec<u8>> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::data_url("missing `data:` prefix"))?;
    let (meta, data) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::data_url("missing `,` separator"))?;
    if meta.ends_with(";base64") {
        STANDARD
            .decode(data)
            .map_err(|e| RenderError::data_url(e.to_string()))
    } else {
        Ok(data.as_bytes().to_vec())
    }
}
