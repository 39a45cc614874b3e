//! `rally` CLI command strings
//!
//! Rally only talks in tables and free text, so several of these commands
//! carry the awk/grep post-processing that turns its output into something
//! line-parseable.

/// Deployment table reduced to the UUID column, one token per line.
///
/// Callers still filter the result for UUID-shaped tokens; the awk pass
/// only strips the table decoration.
pub fn deployment_list() -> String {
    r#"rally deployment list | awk -F '|' 'NR > 1 {gsub(/ /, "", $2); print $2}'"#.to_string()
}

/// Deployment details with the table borders stripped: header line plus
/// one value line.
pub fn deployment_show(uuid: &str) -> String {
    format!("rally deployment show {uuid} | grep -v '^+' | tr -d '|'")
}

pub fn deployment_create(name: &str, config_file: &str) -> String {
    format!("rally deployment create --name {name} --filename {config_file}")
}

pub fn deployment_check(uuid: &str) -> String {
    format!("rally deployment check {uuid}")
}

/// Succeeds only when the Rally database file exists and is non-empty.
pub fn db_check() -> String {
    format!("test -s {}", crate::constants::RALLY_DB_FILE)
}

pub fn db_recreate() -> String {
    "rally-manage db recreate".to_string()
}

pub fn task_list() -> String {
    "rally task list --uuids-only".to_string()
}

/// Launch a scenario asynchronously, all output redirected to `log_file`.
pub fn task_start(scenario: &str, args_file: &str, log_file: &str) -> String {
    format!("rally task start {scenario} --task-args-file {args_file} &> {log_file}")
}

/// Succeeds once the `Using task:` marker has been written to `log_file`.
pub fn task_log_marker(log_file: &str) -> String {
    format!("grep -E '^Using task:' {log_file}")
}

pub fn task_status(uuid: &str) -> String {
    format!("rally task status {uuid}")
}

pub fn task_abort(uuid: &str) -> String {
    format!("rally task abort {uuid}")
}

pub fn task_results(uuid: &str) -> String {
    format!("rally task results {uuid}")
}
