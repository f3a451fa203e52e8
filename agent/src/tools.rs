//! Tool catalog and typed dispatch.
//!
//! The model sees the tool declarations in OpenAI function format; what it
//! sends back is parsed into the closed [`ToolRequest`] enum before anything
//! executes. A name outside the catalog never reaches an executor, it is
//! answered with a structured error payload so the turn can still finish.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use shopmate_completions::{ToolDecl, object_schema};

/// Tool name for text recommendation.
pub const RECOMMEND_PRODUCTS: &str = "recommend_products";

/// Tool name for image-based search.
pub const SEARCH_BY_IMAGE: &str = "search_by_image";

/// Arguments of a `recommend_products` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendProductsArgs {
    /// User preference or query text.
    pub user_preferences: String,

    /// Optional budget cap on the hit price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
}

/// Arguments of a `search_by_image` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchByImageArgs {
    /// URL of the photo to search by.
    pub image_url: String,
}

/// A parsed tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolRequest {
    /// Text-based product recommendation.
    RecommendProducts(RecommendProductsArgs),

    /// Image-based product search.
    SearchByImage(SearchByImageArgs),

    /// A name outside the catalog. Kept so the turn can answer with a
    /// structured error instead of aborting.
    Unknown {
        /// The name the model asked for.
        name: String,
    },
}

impl ToolRequest {
    /// Parse a model-issued call into a typed request.
    ///
    /// Unknown names map to [`ToolRequest::Unknown`]; malformed arguments for
    /// a known name are a deserialization error.
    pub fn parse(name: &str, arguments: &str) -> Result<Self, serde_json::Error> {
        match name {
            RECOMMEND_PRODUCTS => Ok(Self::RecommendProducts(serde_json::from_str(arguments)?)),
            SEARCH_BY_IMAGE => Ok(Self::SearchByImage(serde_json::from_str(arguments)?)),
            _ => Ok(Self::Unknown {
                name: name.to_string(),
            }),
        }
    }

    /// The declared name of this request.
    pub fn name(&self) -> &str {
        match self {
            Self::RecommendProducts(_) => RECOMMEND_PRODUCTS,
            Self::SearchByImage(_) => SEARCH_BY_IMAGE,
            Self::Unknown { name } => name,
        }
    }
}

/// The structured result for a call naming no known tool.
pub fn unknown_tool_result(name: &str) -> Value {
    json!({"error": format!("Unknown function: {name}")})
}

/// The tool declarations advertised to the model on every intent call.
pub fn tool_catalog() -> Vec<ToolDecl> {
    vec![
        ToolDecl::function(
            RECOMMEND_PRODUCTS,
            "Recommend products from the predefined catalog based on user needs.",
            object_schema(&[
                (
                    "user_preferences",
                    json!({
                        "type": "string",
                        "description": "User preference or query (e.g., 'sports t-shirt')."
                    }),
                    true,
                ),
                (
                    "budget",
                    json!({
                        "type": "number",
                        "description": "Optional budget limit."
                    }),
                    false,
                ),
            ]),
        ),
        ToolDecl::function(
            SEARCH_BY_IMAGE,
            "Image-based product search within the predefined catalog.",
            object_schema(&[(
                "image_url",
                json!({
                    "type": "string",
                    "description": "URL of the image to search by."
                }),
                true,
            )]),
        ),
    ]
}

/// One executed tool call, as reported back to the caller of a turn.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInvocation {
    /// Function name.
    pub function: String,

    /// Arguments as parsed from the model.
    pub arguments: Value,

    /// JSON result handed back to the model.
    pub result: Value,
}
