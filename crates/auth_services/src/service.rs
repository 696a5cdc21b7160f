use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::types::{
    AgencyDetails, AgencySummary, AuthError, SignUpRequest, UpdateProfileRequest, User,
    UserProfile, UserRole,
};

const USER_COLUMNS: &str = "id, email, password_hash, role, phone_number, \
     first_name, last_name, birth_date, gender, profile_image, \
     agency_name, latitude, longitude, created_at";

/// A service for handling user account operations: creating users,
/// retrieving user information, verifying credentials, and agency lookups.
pub struct AuthService {
    pool: PgPool,
}

impl AuthService {
    /// Creates a new instance of `AuthService` with the provided database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a new user in the database with the provided sign-up request.
    pub async fn create_user(&self, request: &SignUpRequest) -> Result<User, AuthError> {
        // Check if email already exists
        let existing_user = sqlx::query("SELECT id FROM users WHERE email = $1")
            .bind(request.email.to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        if existing_user.is_some() {
            return Err(AuthError::EmailExists);
        }

        // Hash the password
        let password_hash = hash(&request.password, DEFAULT_COST)?;

        // Split the tagged profile into the nullable column groups
        let mut first_name: Option<&str> = None;
        let mut last_name: Option<&str> = None;
        let mut birth_date: Option<NaiveDate> = None;
        let mut gender: Option<&str> = None;
        let mut profile_image: Option<&str> = None;
        let mut agency_name: Option<&str> = None;
        let mut latitude: Option<f64> = None;
        let mut longitude: Option<f64> = None;

        match &request.profile {
            UserProfile::Client {
                first_name: first,
                last_name: last,
                birth_date: born,
                gender: g,
                profile_image: image,
            } => {
                first_name = Some(first);
                last_name = Some(last);
                birth_date = Some(*born);
                gender = Some(g);
                profile_image = image.as_deref();
            }
            UserProfile::Agency {
                agency_name: name,
                latitude: lat,
                longitude: lon,
            } => {
                agency_name = Some(name);
                latitude = Some(*lat);
                longitude = Some(*lon);
            }
        }

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (
                email, password_hash, role, phone_number,
                first_name, last_name, birth_date, gender, profile_image,
                agency_name, latitude, longitude
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(request.email.to_lowercase().trim())
        .bind(&password_hash)
        .bind(request.profile.role().as_str())
        .bind(request.phone_number.trim())
        .bind(first_name)
        .bind(last_name)
        .bind(birth_date)
        .bind(gender)
        .bind(profile_image)
        .bind(agency_name)
        .bind(latitude)
        .bind(longitude)
        .fetch_one(&self.pool)
        .await?;

        map_user(&row)
    }

    /// Retrieves a user by their email address, returning `None` if not found.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_user).transpose()
    }

    /// Retrieves a user by their ID, returning `None` if not found.
    pub async fn get_user_by_id(&self, user_id: &Uuid) -> Result<Option<User>, AuthError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_user).transpose()
    }

    /// Verifies the user's password against the stored hash.
    pub async fn verify_password(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self
            .get_user_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let is_valid = verify(password, &user.password_hash)?;

        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Updates the authenticated user's contact and client profile fields.
    pub async fn update_profile(
        &self,
        user_id: &Uuid,
        request: &UpdateProfileRequest,
    ) -> Result<User, AuthError> {
        let current_user = self
            .get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        // Reject an email change that would collide with another account
        if let Some(email) = &request.email {
            let email = email.to_lowercase();
            if email != current_user.email {
                let taken = sqlx::query("SELECT id FROM users WHERE email = $1")
                    .bind(&email)
                    .fetch_optional(&self.pool)
                    .await?;
                if taken.is_some() {
                    return Err(AuthError::EmailExists);
                }
            }
        }

        // Birth date and gender only exist on client accounts
        if (request.birth_date.is_some() || request.gender.is_some())
            && current_user.role() != UserRole::Client
        {
            return Err(AuthError::Validation(
                "Birth date and gender apply to client accounts only".to_string(),
            ));
        }

        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET email = COALESCE($1, email),
                phone_number = COALESCE($2, phone_number),
                birth_date = COALESCE($3, birth_date),
                gender = COALESCE($4, gender)
            WHERE id = $5
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(request.email.as_ref().map(|e| e.to_lowercase()))
        .bind(&request.phone_number)
        .bind(request.birth_date)
        .bind(&request.gender)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        map_user(&row)
    }

    /// Lists every agency with the coordinates used by the map view.
    pub async fn list_agencies(&self) -> Result<Vec<AgencySummary>, AuthError> {
        let rows = sqlx::query(
            r#"
            SELECT id, agency_name, latitude, longitude
            FROM users
            WHERE role = 'agency'
            ORDER BY agency_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let agencies = rows
            .into_iter()
            .map(|row| AgencySummary {
                id: row.get("id"),
                agency_name: row
                    .get::<Option<String>, _>("agency_name")
                    .unwrap_or_default(),
                latitude: row.get::<Option<f64>, _>("latitude").unwrap_or_default(),
                longitude: row.get::<Option<f64>, _>("longitude").unwrap_or_default(),
            })
            .collect();

        Ok(agencies)
    }

    /// Retrieves the public details of a single agency.
    pub async fn get_agency(&self, agency_id: &Uuid) -> Result<AgencyDetails, AuthError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, phone_number, agency_name, latitude, longitude
            FROM users
            WHERE id = $1 AND role = 'agency'
            "#,
        )
        .bind(agency_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AuthError::UserNotFound)?;

        Ok(AgencyDetails {
            id: row.get("id"),
            email: row.get("email"),
            phone_number: row.get("phone_number"),
            agency_name: row
                .get::<Option<String>, _>("agency_name")
                .unwrap_or_default(),
            latitude: row.get::<Option<f64>, _>("latitude").unwrap_or_default(),
            longitude: row.get::<Option<f64>, _>("longitude").unwrap_or_default(),
        })
    }
}

/// Maps a `users` row onto the tagged user model.
///
/// Rows whose role tag disagrees with the populated column group surface as
/// `CorruptRecord` instead of leaking half-empty profiles.
fn map_user(row: &PgRow) -> Result<User, AuthError> {
    let role_text: String = row.get("role");
    let role = UserRole::parse(&role_text).ok_or(AuthError::CorruptRecord)?;

    let profile = match role {
        UserRole::Client => UserProfile::Client {
            first_name: row
                .get::<Option<String>, _>("first_name")
                .ok_or(AuthError::CorruptRecord)?,
            last_name: row
                .get::<Option<String>, _>("last_name")
                .ok_or(AuthError::CorruptRecord)?,
            birth_date: row
                .get::<Option<NaiveDate>, _>("birth_date")
                .ok_or(AuthError::CorruptRecord)?,
            gender: row
                .get::<Option<String>, _>("gender")
                .ok_or(AuthError::CorruptRecord)?,
            profile_image: row.get("profile_image"),
        },
        UserRole::Agency => UserProfile::Agency {
            agency_name: row
                .get::<Option<String>, _>("agency_name")
                .ok_or(AuthError::CorruptRecord)?,
            latitude: row
                .get::<Option<f64>, _>("latitude")
                .ok_or(AuthError::CorruptRecord)?,
            longitude: row
                .get::<Option<f64>, _>("longitude")
                .ok_or(AuthError::CorruptRecord)?,
        },
    };

    Ok(User {
        id: row.get("id"),
        email: row.get("email"),
        phone_number: row.get("phone_number"),
        password_hash: row.get("password_hash"),
        profile,
        created_at: row.get("created_at"),
    })
}
