//! WhatsApp enquiry links for purchase intent.

use thiserror::Error;
use url::{Url, form_urlencoded};

use crate::application::presentation::format_price;
use crate::domain::entities::{ProductRecord, SettingsRecord};

const WHATSAPP_BASE: &str = "https://wa.me/";
const SIZE_NOT_APPLICABLE: &str = "Not Applicable";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnquiryError {
    #[error("Please select a size before proceeding.")]
    SizeRequired,
    #[error("size `{size}` is not offered for this product")]
    UnknownSize { size: String },
    #[error("WhatsApp number `{number}` is not valid")]
    InvalidNumber { number: String },
}

#[derive(Debug, Clone)]
pub struct EnquiryRequest<'a> {
    pub product: &'a ProductRecord,
    pub selected_size: Option<&'a str>,
    /// Public link to the product page, quoted in the message.
    pub page_url: &'a str,
}

/// Builds `wa.me` deep links addressed to the storefront's number.
#[derive(Debug, Clone)]
pub struct EnquiryService {
    default_number: String,
}

impl EnquiryService {
    pub fn new(default_number: impl Into<String>) -> Self {
        Self {
            default_number: default_number.into(),
        }
    }

    /// Number from settings when present, otherwise the configured default.
    pub fn resolve_number(&self, settings: Option<&SettingsRecord>) -> String {
        settings
            .and_then(|settings| settings.whatsapp_number.as_deref())
            .map(digits_only)
            .filter(|number| !number.is_empty())
            .unwrap_or_else(|| digits_only(&self.default_number))
    }

    pub fn build_link(
        &self,
        request: &EnquiryRequest<'_>,
        settings: Option<&SettingsRecord>,
    ) -> Result<Url, EnquiryError> {
        let size = validate_size(request.product, request.selected_size)?;
        let number = self.resolve_number(settings);
        if number.is_empty() {
            return Err(EnquiryError::InvalidNumber { number });
        }

        let message = compose_message(request.product, size, request.page_url);
        let mut link = Url::parse(WHATSAPP_BASE)
            .and_then(|base| base.join(&number))
            .map_err(|_| EnquiryError::InvalidNumber {
                number: number.clone(),
            })?;
        link.set_query(Some(&format!("text={}", encode_component(&message))));
        Ok(link)
    }
}

/// Percent-encode with spaces as `%20`. Literal `+` is already `%2B`.
fn encode_component(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

fn validate_size<'a>(
    product: &ProductRecord,
    selected: Option<&'a str>,
) -> Result<Option<&'a str>, EnquiryError> {
    if !product.requires_size() {
        return Ok(None);
    }

    let size = selected
        .map(str::trim)
        .filter(|size| !size.is_empty())
        .ok_or(EnquiryError::SizeRequired)?;

    if product.sizes.iter().any(|offered| offered.trim() == size) {
        Ok(Some(size))
    } else {
        Err(EnquiryError::UnknownSize {
            size: size.to_string(),
        })
    }
}

fn compose_message(product: &ProductRecord, size: Option<&str>, page_url: &str) -> String {
    format!(
        "Hello, I'm interested in this product:\n\n\
         Product: {}\n\
         Price: {}\n\
         Size: {}\n\n\
         Product Link: {}",
        product.name,
        format_price(product.effective_price()),
        size.unwrap_or(SIZE_NOT_APPLICABLE),
        page_url
    )
}

fn digits_only(number: &str) -> String {
    number.chars().filter(char::is_ascii_digit).collect()
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::*;

    fn product(sizes: &[&str]) -> ProductRecord {
        ProductRecord {
            id: Uuid::new_v4(),
            name: "Anarkali Suit".to_string(),
            slug: "anarkali-suit".to_string(),
            price: dec!(4500),
            discount_price: Some(dec!(3999)),
            description: None,
            stock: 4,
            fabric: None,
            color: None,
            style: None,
            sizes: sizes.iter().map(|s| s.to_string()).collect(),
            images: Vec::new(),
            is_new: false,
            is_sale: true,
            category_id: None,
            category: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn settings(number: Option<&str>) -> SettingsRecord {
        SettingsRecord {
            id: Uuid::new_v4(),
            whatsapp_number: number.map(str::to_string),
            hero_title: None,
            hero_subtitle: None,
            announcement_text: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn sized_product_requires_selection() {
        let service = EnquiryService::new("919000000000");
        let product = product(&["S", "M"]);
        let request = EnquiryRequest {
            product: &product,
            selected_size: None,
            page_url: "https://shop.example/product/anarkali-suit",
        };

        let err = service.build_link(&request, None).expect_err("size required");
        assert_eq!(err, EnquiryError::SizeRequired);
        assert_eq!(err.to_string(), "Please select a size before proceeding.");
    }

    #[test]
    fn unknown_size_is_rejected() {
        let service = EnquiryService::new("919000000000");
        let product = product(&["S", "M"]);
        let request = EnquiryRequest {
            product: &product,
            selected_size: Some("XXL"),
            page_url: "https://shop.example/p",
        };
        assert!(matches!(
            service.build_link(&request, None),
            Err(EnquiryError::UnknownSize { .. })
        ));
    }

    #[test]
    fn link_targets_settings_number_and_quotes_details() {
        let service = EnquiryService::new("919000000000");
        let product = product(&["S", "M"]);
        let request = EnquiryRequest {
            product: &product,
            selected_size: Some("M"),
            page_url: "https://shop.example/product/anarkali-suit",
        };

        let link = service
            .build_link(&request, Some(&settings(Some("+91 98765 43210"))))
            .expect("link");

        assert_eq!(link.host_str(), Some("wa.me"));
        assert_eq!(link.path(), "/919876543210");
        let text: String = link
            .query_pairs()
            .find(|(key, _)| key == "text")
            .map(|(_, value)| value.into_owned())
            .expect("text param");
        assert!(text.contains("Product: Anarkali Suit"));
        assert!(text.contains("Price: ₹3,999"));
        assert!(text.contains("Size: M"));
        assert!(text.contains("https://shop.example/product/anarkali-suit"));
    }

    #[test]
    fn unsized_product_uses_default_number() {
        let service = EnquiryService::new("919000000000");
        let product = product(&[]);
        let request = EnquiryRequest {
            product: &product,
            selected_size: None,
            page_url: "https://shop.example/p",
        };

        let link = service
            .build_link(&request, Some(&settings(Some("   "))))
            .expect("link");
        assert_eq!(link.path(), "/919000000000");
        assert!(
            link.query_pairs()
                .any(|(_, value)| value.contains("Size: Not Applicable"))
        );
    }

    #[test]
    fn message_spaces_encode_as_percent_twenty() {
        let service = EnquiryService::new("919000000000");
        let product = product(&[]);
        let request = EnquiryRequest {
            product: &product,
            selected_size: None,
            page_url: "https://shop.example/p?ref=a+b",
        };

        let link = service.build_link(&request, None).expect("link");
        let query = link.query().expect("query");

        assert!(query.starts_with("text=Hello%2C%20I%27m%20interested"));
        assert!(!query.contains('+'));
        assert!(query.contains("ref%3Da%2Bb"));
        let text: String = link
            .query_pairs()
            .find(|(key, _)| key == "text")
            .map(|(_, value)| value.into_owned())
            .expect("text param");
        assert!(text.contains("Size: Not Applicable"));
        assert!(text.ends_with("https://shop.example/p?ref=a+b"));
    }
}
