pub mod validation;

pub use validation::{
    field_errors, validate_month_year, validate_not_blank, validate_price, validate_uuid,
    ValidatedJson, WireFields,
};
