use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Role of a marketplace account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// A client who browses cars and books rentals.
    Client,
    /// An agency that owns and lists cars.
    Agency,
}

impl UserRole {
    /// Returns the role as the string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Client => "client",
            UserRole::Agency => "agency",
        }
    }

    /// Parses a stored role string back into a `UserRole`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "client" => Some(UserRole::Client),
            "agency" => Some(UserRole::Agency),
            _ => None,
        }
    }
}

/// Role-specific profile fields.
///
/// Clients and agencies carry disjoint field sets; tagging the variant by
/// role makes mixed combinations (an agency with a birth date) impossible
/// to construct above the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum UserProfile {
    /// Profile fields specific to client accounts.
    Client {
        /// First name of the client.
        first_name: String,
        /// Last name of the client.
        last_name: String,
        /// Birth date of the client.
        birth_date: NaiveDate,
        /// Gender of the client.
        gender: String,
        /// Optional profile image URL.
        #[serde(default)]
        profile_image: Option<String>,
    },
    /// Profile fields specific to agency accounts.
    Agency {
        /// Display name of the agency.
        agency_name: String,
        /// Latitude of the agency location, for the map view.
        latitude: f64,
        /// Longitude of the agency location, for the map view.
        longitude: f64,
    },
}

impl UserProfile {
    /// Returns the role this profile belongs to.
    pub fn role(&self) -> UserRole {
        match self {
            UserProfile::Client { .. } => UserRole::Client,
            UserProfile::Agency { .. } => UserRole::Agency,
        }
    }
}

/// User model representing a row in the `users` table.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique identifier for the user.
    pub id: Uuid,
    /// Email address of the user.
    pub email: String,
    /// Phone number of the user.
    pub phone_number: String,
    /// Hashed password of the user.
    pub password_hash: String,
    /// Role-specific profile fields.
    pub profile: UserProfile,
    /// Timestamp when the user was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Returns the role of this user.
    pub fn role(&self) -> UserRole {
        self.profile.role()
    }
}

/// Request structure for user sign-up.
///
/// The flattened profile carries the `role` tag plus the role-specific
/// required fields, so a client signup without a birth date (or an agency
/// signup without coordinates) is rejected at deserialization.
#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    /// Email address of the user.
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,

    /// Password for the user account.
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Phone number of the user.
    #[validate(length(min = 8, max = 20, message = "Phone number must be 8-20 characters"))]
    pub phone_number: String,

    /// Role tag plus role-specific fields.
    #[serde(flatten)]
    pub profile: UserProfile,
}

/// Request structure for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address of the user.
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,

    /// Password for the user account.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request structure for updating the authenticated user's profile.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    /// New email address, if changing.
    #[validate(email(message = "Please enter a valid email"))]
    pub email: Option<String>,

    /// New phone number, if changing.
    #[validate(length(min = 8, max = 20, message = "Phone number must be 8-20 characters"))]
    pub phone_number: Option<String>,

    /// New birth date, if changing (client accounts only).
    pub birth_date: Option<NaiveDate>,

    /// New gender, if changing (client accounts only).
    pub gender: Option<String>,
}

/// Information about the user, used in responses.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    /// Unique identifier for the user.
    pub id: Uuid,
    /// Email address of the user.
    pub email: String,
    /// Phone number of the user.
    pub phone_number: String,
    /// Role tag plus role-specific fields.
    #[serde(flatten)]
    pub profile: UserProfile,
    /// Time at which the user was created.
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            phone_number: user.phone_number,
            profile: user.profile,
            created_at: user.created_at,
        }
    }
}

/// Response structure for signup and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Bearer token identifying the caller's id and role.
    pub token: String,
    /// User information.
    pub user: UserInfo,
}

/// Agency entry for the marketplace map listing.
#[derive(Debug, Serialize)]
pub struct AgencySummary {
    /// Unique identifier for the agency account.
    pub id: Uuid,
    /// Display name of the agency.
    pub agency_name: String,
    /// Latitude of the agency location.
    pub latitude: f64,
    /// Longitude of the agency location.
    pub longitude: f64,
}

/// Full agency details returned by the agency profile endpoint.
#[derive(Debug, Serialize)]
pub struct AgencyDetails {
    /// Unique identifier for the agency account.
    pub id: Uuid,
    /// Email address of the agency.
    pub email: String,
    /// Phone number of the agency.
    pub phone_number: String,
    /// Display name of the agency.
    pub agency_name: String,
    /// Latitude of the agency location.
    pub latitude: f64,
    /// Longitude of the agency location.
    pub longitude: f64,
}

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject of the token, the user ID.
    pub sub: String,
    /// Email address of the user.
    pub email: String,
    /// Role of the user.
    pub role: UserRole,
    /// Expiration timestamp of the token.
    pub exp: usize,
    /// Issued at timestamp of the token.
    pub iat: usize,
}

/// Custom error type for authentication-related errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The email address already exists in the system.
    #[error("Email already exists")]
    EmailExists,

    /// The provided credentials are invalid.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The user was not found in the system.
    #[error("User not found")]
    UserNotFound,

    /// A stored user row has role/field combinations the model forbids.
    #[error("User record is inconsistent")]
    CorruptRecord,

    /// An internal database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An error occurred while hashing the password.
    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    /// An error occurred while encoding or decoding a token.
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// An error occurred while validating input data.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl actix_web::ResponseError for AuthError {
    fn error_response(&self) -> actix_web::HttpResponse {
        use actix_web::HttpResponse;

        match self {
            AuthError::EmailExists => HttpResponse::Conflict().json(serde_json::json!({
                "error": "email_exists",
                "message": "An account with this email already exists"
            })),
            AuthError::InvalidCredentials => HttpResponse::Unauthorized().json(serde_json::json!({
                "error": "invalid_credentials",
                "message": "Invalid email or password"
            })),
            AuthError::UserNotFound => HttpResponse::NotFound().json(serde_json::json!({
                "error": "user_not_found",
                "message": "User not found"
            })),
            AuthError::Validation(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "validation_error",
                "message": msg
            })),
            _ => HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "internal_error",
                "message": "An internal error occurred"
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_request_tags_profile_by_role() {
        let json = serde_json::json!({
            "email": "alice@example.com",
            "password": "supersecret",
            "phone_number": "21612345678",
            "role": "client",
            "first_name": "Alice",
            "last_name": "Ben Salah",
            "birth_date": "1995-04-02",
            "gender": "female"
        });

        let request: SignUpRequest = serde_json::from_value(json).unwrap();
        assert!(request.validate().is_ok());
        assert_eq!(request.profile.role(), UserRole::Client);
        assert!(matches!(
            request.profile,
            UserProfile::Client { ref first_name, .. } if first_name == "Alice"
        ));
    }

    #[test]
    fn agency_signup_without_coordinates_is_rejected() {
        let json = serde_json::json!({
            "email": "fleet@example.com",
            "password": "supersecret",
            "phone_number": "21612345678",
            "role": "agency",
            "agency_name": "Fleet & Co"
        });

        assert!(serde_json::from_value::<SignUpRequest>(json).is_err());
    }

    #[test]
    fn role_round_trips_through_storage_form() {
        for role in [UserRole::Client, UserRole::Agency] {
            assert_eq!(UserRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(UserRole::parse("admin"), None);
    }
}
