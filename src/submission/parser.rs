use crate::error::DecodeError;
use crate::models::FormFields;

/// Decode a relayed `application/x-www-form-urlencoded` body.
///
/// Records are split on `&` and each must hold exactly one `=`; a single
/// malformed record rejects the whole payload. Keys and values are then
/// percent-decoded with `+` read as a space. Later duplicates overwrite
/// earlier ones. An empty body is an empty mapping.
pub fn decode(body: &[u8]) -> Result<FormFields, DecodeError> {
    let text = std::str::from_utf8(body).map_err(DecodeError::NotUtf8)?;
    let text = text.trim_end_matches(['\r', '\n']);

    let mut fields = FormFields::new();
    if text.is_empty() {
        return Ok(fields);
    }

    for (index, record) in text.split('&').enumerate() {
        if record.matches('=').count() != 1 {
            return Err(DecodeError::MalformedRecord { index });
        }

        // A record with exactly one '=' always yields exactly one pair.
        if let Some((key, value)) = form_urlencoded::parse(record.as_bytes()).next() {
            fields.insert(key.into_owned(), value.into_owned());
        }
    }

    Ok(fields)
}
