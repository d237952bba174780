/// Tag view of a BIMI record: the logo URL and the optional VMC URL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedBimi {
    pub logo_url: Option<String>,
    pub certificate_url: Option<String>,
}

/// Split a BIMI record on `;` and pick out the `l=` and `a=` tags.
///
/// Values are kept raw and unvalidated; an empty value leaves the field
/// unset. Unknown tags (including `v=`) are ignored.
pub fn parse_bimi_tags(record: &str) -> ParsedBimi {
    let mut parsed = ParsedBimi::default();
    for part in record.split(';') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix("l=") {
            let value = value.trim();
            if !value.is_empty() {
                parsed.logo_url = Some(value.to_string());
            }
        } else if let Some(value) = part.strip_prefix("a=") {
            let value = value.trim();
            if !value.is_empty() {
                parsed.certificate_url = Some(value.to_string());
            }
        }
    }
    parsed
}
