#[allow(clippy::module_name_repetitions)] // For conistency with other modules.
pub fn register_metrics() {
    // Descriptions of labeled metrics
    metrics::describe_gauge!(
        "routerbot_service_access_success",
        "1 if the last access to the service was successful, 0 otherwise."
    );
    metrics::describe_gauge!(
        "routerbot_service_last_access_timestamp_seconds",
        "UNIX timestamp of the last access to the service."
    );
    metrics::describe_counter!(
        "routerbot_messages_total",
        "Number of incoming messages by kind (text, voice, photo)."
    );
    metrics::describe_counter!(
        "routerbot_completions_total",
        "Number of completion requests by outcome."
    );
    metrics::describe_counter!(
        "routerbot_tokens_total",
        "Number of tokens reported by the model API."
    );

    // Constant metrics

    // routerbot_start_time_seconds
    metrics::describe_gauge!(
        "routerbot_start_time_seconds",
        "Unix timestamp of the bot start time."
    );
    metrics::gauge!(
        "routerbot_start_time_seconds",
        std::time::UNIX_EPOCH.elapsed().unwrap_or_default().as_secs_f64(),
    );

    // routerbot_build_info
    metrics::describe_gauge!(
        "routerbot_build_info",
        "A metric with a constant '1' value with the routerbot build information."
    );
    metrics::gauge!(
        "routerbot_build_info",
        1.0,
        "revision" => crate::version(),
    );
}

pub fn update_service(name: &'static str, success: bool) {
    metrics::gauge!(
        "routerbot_service_access_success",
        if success { 1.0 } else { 0.0 },
        "service" => name,
    );
    metrics::gauge!(
        "routerbot_service_last_access_timestamp_seconds",
        std::time::UNIX_EPOCH.elapsed().unwrap_or_default().as_secs_f64(),
        "service" => name,
        "status" => if success { "success" } else { "failure" },
    );
}

pub fn record_message(kind: &'static str) {
    metrics::counter!("routerbot_messages_total", 1, "kind" => kind);
}

/// `outcome` is `"ok"` or a [`CompletionError::kind`].
///
/// [`CompletionError::kind`]: crate::services::CompletionError::kind
pub fn record_completion(outcome: &'static str) {
    metrics::counter!("routerbot_completions_total", 1, "outcome" => outcome);
}

pub fn record_tokens(prompt: u64, completion: u64) {
    metrics::counter!("routerbot_tokens_total", prompt, "type" => "prompt");
    metrics::counter!(
        "routerbot_tokens_total",
        completion,
        "type" => "completion",
    );
}
