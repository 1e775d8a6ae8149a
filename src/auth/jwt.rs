use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use uuid::Uuid;

use crate::models::{Claims, TokenType};

fn now() -> usize {
    Utc::now().timestamp().max(0) as usize
}

fn build_claims(
    token_type: TokenType,
    user_id: u64,
    email: &str,
    role: &str,
    employee_id: u64,
    ttl: usize,
) -> Claims {
    Claims {
        user_id,
        sub: email.to_string(),
        role: role.to_string(),
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type,
        employee_id,
    }
}

pub fn generate_access_token(
    user_id: u64,
    email: &str,
    role: &str,
    employee_id: u64,
    secret: &str,
    ttl: usize,
) -> Result<String, Error> {
    let claims = build_claims(TokenType::Access, user_id, email, role, employee_id, ttl);

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn generate_refresh_token(
    user_id: u64,
    email: &str,
    role: &str,
    employee_id: u64,
    secret: &str,
    ttl: usize,
) -> Result<(String, Claims), Error> {
    let claims = build_claims(TokenType::Refresh, user_id, email, role, employee_id, ttl);

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok((token, claims))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn access_token_carries_principal() {
        let token = generate_access_token(11, "asha@vtc.example", "manager", 7, SECRET, 900).unwrap();
        let claims = verify_token(&token, SECRET).unwrap();

        assert_eq!(claims.user_id, 11);
        assert_eq!(claims.sub, "asha@vtc.example");
        assert_eq!(claims.role, "manager");
        assert_eq!(claims.employee_id, 7);
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn refresh_tokens_get_unique_ids() {
        let (_, a) = generate_refresh_token(1, "a@vtc.example", "employee", 1, SECRET, 60).unwrap();
        let (_, b) = generate_refresh_token(1, "a@vtc.example", "employee", 1, SECRET, 60).unwrap();
        assert_eq!(a.token_type, TokenType::Refresh);
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_access_token(1, "a@vtc.example", "admin", 1, SECRET, 900).unwrap();
        assert!(verify_token(&token, "another-secret").is_err());
    }
}
