//! Field remapping between Outlook (Microsoft Graph) and Zoho CRM shapes.

mod to_outlook;
mod to_zoho;

/// Convert to Microsoft Graph types
pub trait ToOutlook<T> {
    fn to_outlook(&self) -> T;
}

/// Convert to Zoho CRM types
pub trait ToZoho<T> {
    fn to_zoho(&self) -> T;
}

/// `Some(trimmed)` unless the value is missing or blank.
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
