pub mod api_version;
