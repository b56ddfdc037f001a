pub mod auth_service;
pub mod category_service;
pub mod chat_service;
pub mod coupon_service;
pub mod order_service;
pub mod product_service;
pub mod review_service;
pub mod shop_service;
pub mod subcategory_service;
pub mod wishlist_service;

/// Lowercased, hyphen-separated slug for catalog records.
pub(crate) fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut last_was_dash = true;
    for ch in input.chars() {
        if ch.is_alphanumeric() {
            for lower in ch.to_lowercase() {
                slug.push(lower);
            }
            last_was_dash = false;
        } else if !last_was_dash {
            slug.push('-');
            last_was_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn slugs_are_lowercase_and_hyphenated() {
        assert_eq!(slugify("Wireless Mouse"), "wireless-mouse");
        assert_eq!(slugify("  USB-C   Hub!  "), "usb-c-hub");
        assert_eq!(slugify("Ürgriff"), "ürgriff");
    }
}
