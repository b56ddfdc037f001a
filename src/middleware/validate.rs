use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::error::AppError;

/// Deserializes the request body, then runs the DTO's schema validation.
/// The first violation is surfaced as a 400, abort-early style.
pub struct ValidatedJson<T>(pub T);

fn first_violation(errors: &ValidationErrors) -> String {
    for (field, field_errors) in errors.field_errors() {
        if let Some(error) = field_errors.first() {
            if let Some(message) = &error.message {
                return message.to_string();
            }
            return format!("Invalid value for field {field}");
        }
    }
    "Invalid request body".to_string()
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|err| AppError::BadRequest(err.body_text()))?;

        value
            .validate()
            .map_err(|err| AppError::BadRequest(first_violation(&err)))?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Payload {
        #[validate(length(min = 2, message = "Name is too short"))]
        name: String,
    }

    #[test]
    fn surfaces_the_custom_message_of_the_first_violation() {
        let payload = Payload { name: "x".into() };
        let errors = payload.validate().unwrap_err();
        assert_eq!(first_violation(&errors), "Name is too short");
    }
}
