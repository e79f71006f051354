//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` when a migration changes a table.

diesel::table! {
    /// Registered users. `email` carries the `users_email_key` unique index.
    users (id) {
        id -> Int8,
        email -> Varchar,
        name -> Varchar,
        age -> Nullable<Int4>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Posts; rows with `deleted_at` set are soft deleted.
    posts (id) {
        id -> Int8,
        author_id -> Int8,
        content -> Text,
        caption -> Nullable<Varchar>,
        created_at -> Timestamptz,
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    comments (id) {
        id -> Int8,
        post_id -> Int8,
        author_id -> Int8,
        content -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    likes (user_id, post_id) {
        user_id -> Int8,
        post_id -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    follows (follower_id, followee_id) {
        follower_id -> Int8,
        followee_id -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(posts -> users (author_id));
diesel::joinable!(comments -> posts (post_id));
diesel::joinable!(likes -> posts (post_id));

diesel::allow_tables_to_appear_in_same_query!(users, posts, comments, likes, follows);
