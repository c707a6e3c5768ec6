// Client-facing validation messages. Clients match on these strings, so they
// are kept byte-for-byte stable.

pub const REQUIRED: &str = "This field is required.";
pub const NULL: &str = "This field may not be null.";
pub const NOT_A_STRING: &str = "Not a valid string.";
pub const BLANK: &str = "This field may not be blank.";
pub const INVALID_EMAIL: &str = "Enter a valid email address.";
pub const INVALID_NUMBER: &str = "A valid number is required.";
pub const INVALID_CURRENCY: &str = "Enter a valid ISO 4217 currency code.";

pub const NOT_POLYGON: &str = "The value of this field should be \"Polygon\".";
pub const GEOJSON_STRUCTURE: &str = "This field should follow GeoJSON object structure.";
pub const MIN_VERTICES: &str = "A Polygon should have at least 4 vertex points.";
pub const COORDINATE_ARITY: &str = "Every coordinate should have 2 values.";
pub const RING_NOT_CLOSED: &str = "First and last value coordinates should match.";

pub fn max_length(limit: usize) -> String {
    format!("Ensure this field has no more than {limit} characters.")
}

pub fn invalid_choice(value: &str) -> String {
    format!("\"{value}\" is not a valid choice.")
}

pub fn not_a_list(shape: &str) -> String {
    format!("Expected a list of items but got type \"{shape}\".")
}

pub fn not_a_dict(shape: &str) -> String {
    format!("Invalid data. Expected a dictionary, but got {shape}.")
}

pub fn max_digits(limit: u32) -> String {
    format!("Ensure that there are no more than {limit} digits in total.")
}

pub fn max_decimal_places(limit: u32) -> String {
    format!("Ensure that there are no more than {limit} decimal places.")
}

pub fn max_whole_digits(limit: u32) -> String {
    format!("Ensure that there are no more than {limit} digits before the decimal point.")
}

pub fn already_exists(entity: &str, field: &str) -> String {
    format!("{entity} with this {field} already exists.")
}
