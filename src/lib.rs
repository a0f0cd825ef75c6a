pub mod analyze;
pub mod config;

pub mod data {
    pub mod columnar;
    pub mod loader;
    pub mod sca;
}

pub mod metrics {
    pub mod confidence;
    pub mod run_metrics;
}

pub mod plot {
    pub mod bars;
    pub mod to_html;
}

pub mod report {
    pub mod summary;
}
