use std::sync::Arc;
use serde_json::json;

use crate::catalog::{NodeCatalog, NodeCategory, NodeDefinition, SocketDefinition, SocketType};
use crate::ops::builtin::{CollectOp, MathOp, NumberInputOp, SettingsOp, TemplateOp, TextInputOp};
use crate::ops::generation::{GenerateImageOp, GenerateTextOp, GenerationClient};

impl NodeCatalog {
    /// The node kinds the studio ships with. Generation nodes share the
    /// given client; everything else is a pure transform.
    pub fn builtin(client: GenerationClient) -> Self {
        let mut catalog = NodeCatalog::new();

        catalog.register(
            NodeDefinition::new("text-input", "Text", NodeCategory::Input)
                .output(SocketDefinition::optional("text", "Text", SocketType::Text))
                .config_default("text", json!("")),
            Arc::new(TextInputOp),
        );

        catalog.register(
            NodeDefinition::new("number-input", "Number", NodeCategory::Input)
                .output(SocketDefinition::optional("value", "Value", SocketType::Number))
                .config_default("value", json!(0)),
            Arc::new(NumberInputOp),
        );

        catalog.register(
            NodeDefinition::new("generation-settings", "Settings", NodeCategory::Input)
                .output(SocketDefinition::optional(
                    "settings",
                    "Settings",
                    SocketType::Settings,
                ))
                .config_default("width", json!(1024))
                .config_default("height", json!(1024))
                .config_default("steps", json!(30)),
            Arc::new(SettingsOp),
        );

        catalog.register(
            NodeDefinition::new("text-template", "Template", NodeCategory::Utility)
                .input(SocketDefinition::required("a", "A", SocketType::Text))
                .input(
                    SocketDefinition::optional("b", "B", SocketType::Text)
                        .with_default(json!("")),
                )
                .output(SocketDefinition::optional("text", "Text", SocketType::Text))
                .config_default("template", json!("{a}")),
            Arc::new(TemplateOp),
        );

        catalog.register(
            NodeDefinition::new("math-expression", "Math", NodeCategory::Utility)
                .input(SocketDefinition::required("a", "A", SocketType::Number))
                .input(
                    SocketDefinition::optional("b", "B", SocketType::Number)
                        .with_default(json!(0)),
                )
                .output(SocketDefinition::optional("value", "Value", SocketType::Number))
                .config_default("expression", json!("a")),
            Arc::new(MathOp),
        );

        catalog.register(
            NodeDefinition::new("generate-text", "Generate Text", NodeCategory::Processing)
                .input(SocketDefinition::required("prompt", "Prompt", SocketType::Text))
                .output(SocketDefinition::optional("text", "Text", SocketType::Text)),
            Arc::new(GenerateTextOp::new(client.clone())),
        );

        catalog.register(
            NodeDefinition::new("generate-image", "Generate Image", NodeCategory::Processing)
                .input(SocketDefinition::required("prompt", "Prompt", SocketType::Text))
                .input(
                    SocketDefinition::optional("settings", "Settings", SocketType::Settings)
                        .with_default(json!({})),
                )
                .output(SocketDefinition::optional("image", "Image", SocketType::Image)),
            Arc::new(GenerateImageOp::new(client)),
        );

        catalog.register(
            NodeDefinition::new("text-output", "Text Output", NodeCategory::Output)
                .input(SocketDefinition::required("text", "Text", SocketType::Text)),
            Arc::new(CollectOp),
        );

        catalog.register(
            NodeDefinition::new("image-output", "Image Output", NodeCategory::Output)
                .input(SocketDefinition::required("image", "Image", SocketType::Image)),
            Arc::new(CollectOp),
        );

        catalog
    }
}
