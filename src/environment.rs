use std::env;

use lazy_static::lazy_static;

lazy_static! {
    pub static ref MONGODB_URI: String = env::var("MONGODB_URI")
        .or_else(|_| env::var("uri"))
        .expect("MONGODB_URI must be set");
    pub static ref CLOUDINARY_NAME: String =
        env::var("CLOUDINARY_NAME").expect("CLOUDINARY_NAME must be set");
    pub static ref CLOUDINARY_API_KEY: String =
        env::var("CLOUDINARY_API_KEY").expect("CLOUDINARY_API_KEY must be set");
    pub static ref CLOUDINARY_API_SECRET: String =
        env::var("CLOUDINARY_API_SECRET").expect("CLOUDINARY_API_SECRET must be set");
    pub static ref HOST: String = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    pub static ref PORT: u16 = env::var("PORT")
        .map(|p| p.parse().expect("PORT must be a valid port number"))
        .unwrap_or(5000);
    pub static ref UPLOAD_DIR: String =
        env::var("UPLOAD_DIR").unwrap_or_else(|_| "upload".to_string());
}
