//! Annotate request body.
//!
//! ```json
//! {"requests": {"image": {"content": "<base64>"},
//!               "features": [{"type": "LOGO_DETECTION", "maxResults": 5}, ...]}}
//! ```
//!
//! `requests` is a single object unless [`RequestShape::Batch`] is configured.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::config::RequestShape;
use crate::encoding::EncodedImage;

/// Detection categories requested for every image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureType {
    LogoDetection,
    LabelDetection,
    TextDetection,
    LandmarkDetection,
}

impl FeatureType {
    /// The four features requested, in request order.
    pub const REQUESTED: [FeatureType; 4] = [
        FeatureType::LogoDetection,
        FeatureType::LabelDetection,
        FeatureType::TextDetection,
        FeatureType::LandmarkDetection,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSpec {
    #[serde(rename = "type")]
    pub kind: FeatureType,
    pub max_results: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageContent {
    pub content: String,
}

/// One image plus the features asked of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotateItem {
    pub image: ImageContent,
    pub features: Vec<FeatureSpec>,
}

/// Full request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRequest {
    pub shape: RequestShape,
    pub item: AnnotateItem,
}

impl Serialize for AnnotationRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut body = serializer.serialize_struct("AnnotationRequest", 1)?;
        match self.shape {
            RequestShape::Single => body.serialize_field("requests", &self.item)?,
            RequestShape::Batch => body.serialize_field("requests", &[&self.item])?,
        }
        body.end()
    }
}

impl AnnotationRequest {
    pub fn new(image: &EncodedImage, max_results: u32, shape: RequestShape) -> Self {
        let features = FeatureType::REQUESTED
            .iter()
            .map(|&kind| FeatureSpec { kind, max_results })
            .collect();
        Self {
            shape,
            item: AnnotateItem {
                image: ImageContent {
                    content: image.base64.clone(),
                },
                features,
            },
        }
    }

    /// JSON body bytes.
    pub fn to_vec(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
