//! Connection-table platform (Windows tools).
//!
//! Uses the following system commands:
//! - `netstat -ano` to list every socket with its owning PID
//! - `tasklist /FI "PID eq X" /FO CSV /NH` for names and presence checks
//! - `taskkill /PID X /F` to terminate

use crate::ports::{CommandError, LookupMode, ProcessPlatform};

use super::command;

/// PIDs 0-4 are the idle and System processes.
const SYSTEM_PID_CEILING: u32 = 4;

/// Platform whose socket tool reports every connection in one call.
#[derive(Debug, Default, Clone)]
pub struct NetstatPlatform;

impl NetstatPlatform {
    pub fn new() -> Self {
        Self
    }

    async fn tasklist(&self, pid: u32) -> Result<String, CommandError> {
        let filter = format!("PID eq {}", pid);
        command::stdout("tasklist", &["/FI", &filter, "/FO", "CSV", "/NH"]).await
    }

    /// Parse a CSV line, handling quoted fields
    ///
    /// ```text
    /// "node.exe","5432","Console","1","45,000 K"
    /// ```
    fn parse_csv_line(line: &str) -> Vec<&str> {
        let mut fields = Vec::new();
        let mut in_quotes = false;
        let mut field_start: Option<usize> = None;

        for (i, c) in line.char_indices() {
            match c {
                '"' if in_quotes => {
                    if let Some(start) = field_start {
                        fields.push(&line[start..i]);
                    }
                    field_start = None;
                    in_quotes = false;
                }
                '"' => {
                    in_quotes = true;
                    field_start = Some(i + 1);
                }
                ',' if !in_quotes => {
                    if let Some(start) = field_start {
                        fields.push(&line[start..i]);
                        field_start = None;
                    }
                }
                _ => {
                    if field_start.is_none() && !in_quotes {
                        field_start = Some(i);
                    }
                }
            }
        }

        if let Some(start) = field_start {
            if !in_quotes {
                fields.push(&line[start..]);
            }
        }

        fields
    }

    /// Find the image name for `pid` in tasklist CSV output.
    ///
    /// When nothing matches, tasklist prints an `INFO:` line instead.
    fn parse_tasklist_name(output: &str, pid: u32) -> Option<String> {
        Self::tasklist_rows(output)
            .find(|fields| fields.get(1).and_then(|p| p.parse::<u32>().ok()) == Some(pid))
            .and_then(|fields| fields.first().map(|name| name.to_string()))
            .filter(|name| !name.is_empty())
    }

    fn tasklist_rows<'a>(output: &'a str) -> impl Iterator<Item = Vec<&'a str>> + 'a {
        output
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with('"') && !line.starts_with("\"Image Name\""))
            .map(Self::parse_csv_line)
    }
}

impl ProcessPlatform for NetstatPlatform {
    fn lookup_mode(&self) -> LookupMode {
        LookupMode::ConnectionTable
    }

    fn protected_pid_ceiling(&self) -> u32 {
        SYSTEM_PID_CEILING
    }

    async fn enumerate_connections(&self, _port: u16) -> Result<String, CommandError> {
        command::stdout("netstat", &["-ano"]).await
    }

    async fn lookup_process_name(&self, pid: u32) -> Result<Option<String>, CommandError> {
        let output = self.tasklist(pid).await?;
        Ok(Self::parse_tasklist_name(&output, pid))
    }

    async fn terminate(&self, pid: u32) -> Result<(), CommandError> {
        command::stdout("taskkill", &["/PID", &pid.to_string(), "/F"]).await?;
        Ok(())
    }

    async fn is_running(&self, pid: u32) -> Result<bool, CommandError> {
        // tasklist exits 0 with an INFO line when the filter matches nothing
        let output = self.tasklist(pid).await?;
        Ok(Self::parse_tasklist_name(&output, pid).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TASKLIST: &str = r#"
"System","4","Services","0","144 K"
"node.exe","5432","Console","1","45,000 K"
"#;

    #[test]
    fn test_parse_csv_line() {
        let line = r#""node.exe","5432","Console","1","45,000 K""#;
        let fields = NetstatPlatform::parse_csv_line(line);

        assert_eq!(fields.len(), 5);
        assert_eq!(fields[0], "node.exe");
        assert_eq!(fields[1], "5432");
        assert_eq!(fields[4], "45,000 K");
    }

    #[test]
    fn test_parse_tasklist_name() {
        assert_eq!(
            NetstatPlatform::parse_tasklist_name(TASKLIST, 5432),
            Some("node.exe".to_string())
        );
        assert_eq!(
            NetstatPlatform::parse_tasklist_name(TASKLIST, 4),
            Some("System".to_string())
        );
    }

    #[test]
    fn test_pid_must_match_exactly() {
        // 543 is a prefix of 5432 and must not match
        assert_eq!(NetstatPlatform::parse_tasklist_name(TASKLIST, 543), None);
    }

    #[test]
    fn test_no_tasks_info_line() {
        let output = "INFO: No tasks are running which match the specified criteria.\r\n";
        assert_eq!(NetstatPlatform::parse_tasklist_name(output, 5432), None);
    }

    #[test]
    fn test_header_line_is_skipped() {
        let output = "\"Image Name\",\"PID\",\"Session Name\"\r\n\"python.exe\",\"77\",\"Console\"\r\n";
        assert_eq!(
            NetstatPlatform::parse_tasklist_name(output, 77),
            Some("python.exe".to_string())
        );
    }

    #[test]
    fn test_protected_ceiling() {
        let platform = NetstatPlatform::new();
        assert_eq!(platform.protected_pid_ceiling(), 4);
        assert_eq!(platform.lookup_mode(), LookupMode::ConnectionTable);
    }
}
