use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "org": { "type": "string" },
            "api": { "type": "string", "format": "uri" },
            "app_url": { "type": "string", "format": "uri" },
            "token": { "type": "string" },
            "tool": { "type": "string", "pattern": "^[A-Za-z0-9@/._-]+$" },
            "policy_file": { "type": "string" },
            "ignore_expiry_days": { "type": "integer", "minimum": 1 },
            "ci": { "type": "boolean" }
        }
    })
});
