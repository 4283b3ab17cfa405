use serde::{Deserialize, Deserializer, Serialize};

use crate::protocol::ACCEPTED_EXTENSIONS;

/// One row of extracted report data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireParameter")]
pub struct HealthParameter {
    pub parameter: String,
    pub value: String,
    pub unit: String,
    pub range: String,
    /// `value` arrived as the JSON number zero. It is displayed but never classified.
    #[serde(skip)]
    numeric_zero: bool,
}

impl HealthParameter {
    pub fn new(
        parameter: impl Into<String>,
        value: impl Into<String>,
        unit: impl Into<String>,
        range: impl Into<String>,
    ) -> Self {
        Self {
            parameter: parameter.into(),
            value: value.into(),
            unit: unit.into(),
            range: range.into(),
            numeric_zero: false,
        }
    }

    pub fn is_abnormal(&self) -> bool {
        if self.numeric_zero {
            return false;
        }
        crate::range::is_abnormal(&self.value, &self.range)
    }
}

#[derive(Deserialize)]
struct WireParameter {
    #[serde(deserialize_with = "text_or_number")]
    parameter: String,
    #[serde(default)]
    value: Option<TextOrNumber>,
    #[serde(default, deserialize_with = "text_or_number")]
    unit: String,
    #[serde(default, deserialize_with = "text_or_number")]
    range: String,
}

impl From<WireParameter> for HealthParameter {
    fn from(wire: WireParameter) -> Self {
        let numeric_zero = matches!(
            &wire.value,
            Some(TextOrNumber::Number(number)) if number.as_f64() == Some(0.0)
        );
        Self {
            numeric_zero,
            ..Self::new(
                wire.parameter,
                wire.value.map(TextOrNumber::into_text).unwrap_or_default(),
                wire.unit,
                wire.range,
            )
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(serde_json::Number),
}

impl TextOrNumber {
    fn into_text(self) -> String {
        match self {
            TextOrNumber::Text(text) => text,
            TextOrNumber::Number(number) => number.to_string(),
        }
    }
}

fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<TextOrNumber>::deserialize(deserializer)?
        .map(TextOrNumber::into_text)
        .unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Image,
    Other,
}

impl FileKind {
    pub fn badge(self) -> &'static str {
        match self {
            FileKind::Pdf => "📄",
            FileKind::Image => "🖼️",
            FileKind::Other => "📁",
        }
    }
}

/// A file picked or dropped by the user, held in memory until submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = mime_guess::from_path(&name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            name,
            mime_type,
            bytes,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn kind(&self) -> FileKind {
        if self.mime_type == "application/pdf" {
            FileKind::Pdf
        } else if self.mime_type.starts_with("image/") {
            FileKind::Image
        } else {
            FileKind::Other
        }
    }

    /// Whether the extension is one the picker suggests. Advisory only.
    pub fn has_accepted_extension(&self) -> bool {
        let Some((_, extension)) = self.name.rsplit_once('.') else {
            return false;
        };
        ACCEPTED_EXTENSIONS
            .iter()
            .any(|accepted| extension.eq_ignore_ascii_case(accepted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_kind_follows_guessed_mime_type() {
        assert_eq!(SelectedFile::new("report.pdf", Vec::new()).kind(), FileKind::Pdf);
        assert_eq!(SelectedFile::new("scan.PNG", Vec::new()).kind(), FileKind::Image);
        assert_eq!(SelectedFile::new("notes", Vec::new()).kind(), FileKind::Other);
        assert_eq!(
            SelectedFile::new("blob.bin", Vec::new())
                .with_mime_type("image/jpeg")
                .kind(),
            FileKind::Image
        );
    }

    #[test]
    fn accepted_extension_check_is_case_insensitive() {
        assert!(SelectedFile::new("a.PDF", Vec::new()).has_accepted_extension());
        assert!(SelectedFile::new("a.jpg", Vec::new()).has_accepted_extension());
        assert!(!SelectedFile::new("a.jpeg", Vec::new()).has_accepted_extension());
        assert!(!SelectedFile::new("pdf", Vec::new()).has_accepted_extension());
    }

    #[test]
    fn parameter_accepts_numeric_and_missing_fields() {
        let row: HealthParameter =
            serde_json::from_str(r#"{"parameter":"Hemoglobin","value":13.5,"range":"12.0-16.0"}"#)
                .expect("decode row");
        assert_eq!(
            row,
            HealthParameter::new("Hemoglobin", "13.5", "", "12.0-16.0")
        );
        assert!(!row.is_abnormal());
    }

    #[test]
    fn parameter_treats_null_as_empty() {
        let row: HealthParameter =
            serde_json::from_str(r#"{"parameter":"Impression","value":null,"unit":null,"range":null}"#)
                .expect("decode row");
        assert!(row.value.is_empty());
        assert!(!row.is_abnormal());
    }

    #[test]
    fn numeric_zero_value_is_shown_but_not_classified() {
        let rows: Vec<HealthParameter> = serde_json::from_str(
            r#"[
                {"parameter":"Ketones","value":0,"unit":"mmol/L","range":"1-5"},
                {"parameter":"Ketones","value":0.0,"range":"1-5"},
                {"parameter":"Ketones","value":"0","range":"1-5"},
                {"parameter":"Ketones","value":7,"range":"1-5"}
            ]"#,
        )
        .expect("decode rows");

        assert_eq!(rows[0].value, "0");
        assert!(!rows[0].is_abnormal());
        assert!(!rows[1].is_abnormal());
        assert!(rows[2].is_abnormal());
        assert!(rows[3].is_abnormal());
    }
}
