//! Wire DTOs for the upstream users API.
//!
//! Kept separate from the domain types so upstream schema drift surfaces
//! here, in one place, as decode errors.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Gender, PageMeta, User, UserDraft, UserPage};

/// `GET /users` response envelope.
#[derive(Debug, Deserialize)]
pub struct ListEnvelopeDto {
    pub data: Vec<UserDto>,
    pub meta: MetaDto,
}

impl ListEnvelopeDto {
    pub fn into_domain(self) -> UserPage {
        UserPage {
            users: self.data.into_iter().map(UserDto::into_domain).collect(),
            meta: self.meta.into_domain(),
        }
    }
}

/// Pagination block of the list envelope.
#[derive(Debug, Deserialize)]
pub struct MetaDto {
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
}

impl MetaDto {
    pub fn into_domain(self) -> PageMeta {
        PageMeta {
            total_count: self.total_count,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Single-user response envelope (`GET /users/{id}`, create, update).
#[derive(Debug, Deserialize)]
pub struct UserEnvelopeDto {
    pub data: UserDto,
}

/// One user on the wire.
#[derive(Debug, Deserialize)]
pub struct UserDto {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub birthdate: String,
    pub gender: Gender,
}

impl UserDto {
    pub fn into_domain(self) -> User {
        User {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            birthdate: self.birthdate,
            gender: self.gender,
        }
    }
}

/// Request body for create and update: `{"user": {...}}`.
#[derive(Debug, Serialize)]
pub struct UserBodyDto<'a> {
    pub user: UserFieldsDto<'a>,
}

impl<'a> UserBodyDto<'a> {
    pub fn from_draft(draft: &'a UserDraft) -> Self {
        Self {
            user: UserFieldsDto {
                first_name: &draft.first_name,
                last_name: &draft.last_name,
                birthdate: draft.birthdate,
                gender: draft.gender,
            },
        }
    }
}

/// User fields nested under the `user` key.
#[derive(Debug, Serialize)]
pub struct UserFieldsDto<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub birthdate: NaiveDate,
    pub gender: Gender,
}

/// 422 response body carrying per-field messages.
#[derive(Debug, Deserialize)]
pub struct ErrorsDto {
    #[serde(default)]
    pub errors: BTreeMap<String, Vec<String>>,
}

/// `POST /import` response body.
#[derive(Debug, Deserialize)]
pub struct ImportResponseDto {
    #[serde(default)]
    pub message: Option<String>,
}
