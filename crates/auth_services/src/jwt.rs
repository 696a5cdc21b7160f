use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::middleware::AuthenticatedUser;
use crate::types::{AuthError, Claims, User};

/// Service for issuing and verifying bearer tokens.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    /// Creates a JWT service from the `JWT_SECRET` environment variable.
    pub fn new() -> Self {
        let secret = std::env::var("JWT_SECRET")
            .unwrap_or_else(|_| "your-secret-key-change-this-in-production".to_string());

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
        }
    }

    /// Generates a short-lived access token carrying the user's id and role.
    pub fn generate_access_token(&self, user: &User) -> Result<String, AuthError> {
        let expiration = Utc::now()
            .checked_add_signed(Duration::hours(1))
            .expect("valid timestamp")
            .timestamp() as usize;

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role(),
            exp: expiration,
            iat: Utc::now().timestamp() as usize,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Verifies a token's signature and expiry and returns its claims.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data = decode::<Claims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )?;

        Ok(token_data.claims)
    }

    /// Verifies a token and resolves the calling identity from its claims.
    pub fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let claims = self.verify_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
            AuthError::Jwt(jsonwebtoken::errors::Error::from(
                jsonwebtoken::errors::ErrorKind::InvalidSubject,
            ))
        })?;

        Ok(AuthenticatedUser {
            id: user_id,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{UserProfile, UserRole};

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "fleet@example.com".to_string(),
            phone_number: "21612345678".to_string(),
            password_hash: "$2b$12$fake".to_string(),
            profile: UserProfile::Agency {
                agency_name: "Fleet & Co".to_string(),
                latitude: 36.8,
                longitude: 10.18,
            },
            created_at: Utc::now(),
        }
    }

    #[test]
    fn access_token_round_trips_id_and_role() {
        let service = JwtService::new();
        let user = sample_user();

        let token = service.generate_access_token(&user).unwrap();
        let identity = service.authenticate(&token).unwrap();

        assert_eq!(identity.id, user.id);
        assert_eq!(identity.role, UserRole::Agency);
    }

    #[test]
    fn garbage_token_is_rejected() {
        let service = JwtService::new();
        assert!(service.authenticate("not-a-token").is_err());
    }
}
