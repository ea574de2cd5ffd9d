mod engine;
mod history_report;
