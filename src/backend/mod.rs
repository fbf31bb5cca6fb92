pub mod js_backend;
