pub mod app;

pub mod config {
    pub mod environment;
}

pub mod module {
    pub mod license {
        pub mod controller;
        pub mod error;
        pub mod route;
        pub mod schema;
    }
}

pub mod service;
