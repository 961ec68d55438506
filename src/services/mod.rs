pub mod postgrest;
pub mod supabase_auth;
