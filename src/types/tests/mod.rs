mod event;
mod metrics;
