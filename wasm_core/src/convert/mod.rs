pub mod code;
pub mod json_utils;
pub mod markdown;
pub mod text;
pub mod xml;
