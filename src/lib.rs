pub mod isp_frontend;
pub mod logger;
