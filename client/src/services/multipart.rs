//! Transport-independent multipart form.
//!
//! Goal create/edit requests are sent as `multipart/form-data` so an image can
//! travel with the text fields. Forms are built here and only converted to the
//! HTTP library's representation at send time, which keeps them inspectable.

/// Binary file attached to a form
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PartValue {
    Text(String),
    File(FilePart),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub value: PartValue,
}

/// Ordered list of named parts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            value: PartValue::Text(value.into()),
        });
        self
    }

    /// Append a text part only when `value` is `Some`
    pub fn text_opt(self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.text(name, value),
            None => self,
        }
    }

    pub fn file(mut self, name: impl Into<String>, file: FilePart) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            value: PartValue::File(file),
        });
        self
    }

    pub fn into_parts(self) -> Vec<FormPart> {
        self.parts
    }

    /// Names of all parts, in insertion order
    pub fn field_names(&self) -> Vec<&str> {
        self.parts.iter().map(|p| p.name.as_str()).collect()
    }

    /// Text value of the first part with this name
    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.parts.iter().find(|p| p.name == name).and_then(|p| match &p.value {
            PartValue::Text(text) => Some(text.as_str()),
            PartValue::File(_) => None,
        })
    }

    pub fn file_value(&self, name: &str) -> Option<&FilePart> {
        self.parts.iter().find(|p| p.name == name).and_then(|p| match &p.value {
            PartValue::File(file) => Some(file),
            PartValue::Text(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_order_and_skips_none() {
        let form = MultipartForm::new()
            .text("user_id", "5")
            .text_opt("goal_name", None::<String>)
            .text_opt("goal_description", Some("Beach"))
            .file(
                "goal_image",
                FilePart {
                    file_name: "beach.png".to_string(),
                    content_type: "image/png".to_string(),
                    bytes: vec![1, 2, 3],
                },
            );

        assert_eq!(form.field_names(), vec!["user_id", "goal_description", "goal_image"]);
        assert_eq!(form.text_value("goal_description"), Some("Beach"));
        assert_eq!(form.text_value("goal_image"), None);
        assert_eq!(form.file_value("goal_image").unwrap().bytes, vec![1, 2, 3]);
    }
}
