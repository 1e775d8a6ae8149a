use base64::{Engine as _, engine::general_purpose::STANDARD};
use derive_more::Display;

/// A decoded `data:<mime>;base64,<payload>` URL.
#[derive(Debug, PartialEq, Eq)]
pub struct DataUrl {
    pub mime: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Display, PartialEq, Eq)]
pub enum DataUrlError {
    #[display(fmt = "Upload must be a base64 data URL")]
    Malformed,
    #[display(fmt = "Upload is not valid base64")]
    NotBase64,
    #[display(fmt = "Upload is empty")]
    Empty,
    #[display(fmt = "Upload exceeds {} bytes", _0)]
    TooLarge(usize),
    #[display(fmt = "Unsupported file type: {}", _0)]
    UnsupportedType(String),
}

impl DataUrl {
    pub fn parse(raw: &str, max_bytes: usize, allowed: &[&str]) -> Result<Self, DataUrlError> {
        let rest = raw.trim().strip_prefix("data:").ok_or(DataUrlError::Malformed)?;
        let (header, payload) = rest.split_once(',').ok_or(DataUrlError::Malformed)?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or(DataUrlError::Malformed)?
            .to_ascii_lowercase();

        if !allowed.contains(&mime.as_str()) {
            return Err(DataUrlError::UnsupportedType(mime));
        }

        // base64 expands 3 bytes into 4 chars
        if payload.len() / 4 * 3 > max_bytes + 3 {
            return Err(DataUrlError::TooLarge(max_bytes));
        }

        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|_| DataUrlError::NotBase64)?;

        if bytes.is_empty() {
            return Err(DataUrlError::Empty);
        }
        if bytes.len() > max_bytes {
            return Err(DataUrlError::TooLarge(max_bytes));
        }

        Ok(Self { mime, bytes })
    }

    pub fn extension(&self) -> &'static str {
        extension_for(&self.mime)
    }
}

pub fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "application/pdf" => "pdf",
        _ => "bin",
    }
}

pub const SELFIE_TYPES: &[&str] = &["image/png", "image/jpeg"];
pub const DOCUMENT_TYPES: &[&str] = &["application/pdf", "image/png", "image/jpeg"];

#[cfg(test)]
mod tests {
    use super::*;

    fn png_url(bytes: &[u8]) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(bytes))
    }

    #[test]
    fn decodes_a_png_selfie() {
        let parsed = DataUrl::parse(&png_url(b"\x89PNG fake"), 1024, SELFIE_TYPES).unwrap();
        assert_eq!(parsed.mime, "image/png");
        assert_eq!(parsed.bytes, b"\x89PNG fake");
        assert_eq!(parsed.extension(), "png");
    }

    #[test]
    fn rejects_non_data_urls() {
        assert_eq!(
            DataUrl::parse("https://cdn/selfie.png", 1024, SELFIE_TYPES),
            Err(DataUrlError::Malformed)
        );
        assert_eq!(
            DataUrl::parse("data:image/png,plain", 1024, SELFIE_TYPES),
            Err(DataUrlError::Malformed)
        );
    }

    #[test]
    fn rejects_types_outside_the_list() {
        let url = format!("data:application/pdf;base64,{}", STANDARD.encode(b"%PDF"));
        assert_eq!(
            DataUrl::parse(&url, 1024, SELFIE_TYPES),
            Err(DataUrlError::UnsupportedType("application/pdf".into()))
        );
        assert!(DataUrl::parse(&url, 1024, DOCUMENT_TYPES).is_ok());
    }

    #[test]
    fn errors_read_as_messages() {
        assert_eq!(DataUrlError::TooLarge(16).to_string(), "Upload exceeds 16 bytes");
        assert_eq!(
            DataUrlError::UnsupportedType("text/html".into()).to_string(),
            "Unsupported file type: text/html"
        );
        assert_eq!(DataUrlError::Malformed.to_string(), "Upload must be a base64 data URL");
    }

    #[test]
    fn enforces_size_and_content() {
        assert_eq!(
            DataUrl::parse(&png_url(&[7u8; 64]), 16, SELFIE_TYPES),
            Err(DataUrlError::TooLarge(16))
        );
        assert_eq!(
            DataUrl::parse("data:image/png;base64,", 16, SELFIE_TYPES),
            Err(DataUrlError::Empty)
        );
        assert_eq!(
            DataUrl::parse("data:image/png;base64,@@@@", 16, SELFIE_TYPES),
            Err(DataUrlError::NotBase64)
        );
    }
}
