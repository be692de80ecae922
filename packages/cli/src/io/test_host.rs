//! Scripted host: queued input in, recorded output out.

use std::collections::VecDeque;

use super::{Input, IoError, IoHost, Output, OutputStyle, PromptConfig};

/// Reads from a queue and records everything written to it.
///
/// Once the queue runs dry every read is `Input::Eof`, so a test that
/// forgets to `exit` still terminates.
#[derive(Debug, Default)]
pub struct TestHost {
    queue: VecDeque<Input>,
    written: Vec<Output>,
    prompts: Vec<PromptConfig>,
    flushes: usize,
}

impl TestHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_input(&mut self, line: impl Into<String>) {
        self.queue.push_back(Input::Line(line.into()));
    }

    pub fn queue_inputs(&mut self, lines: impl IntoIterator<Item = impl Into<String>>) {
        lines.into_iter().for_each(|line| self.queue_input(line));
    }

    /// Queue Ctrl+C or Ctrl+D.
    pub fn queue_key(&mut self, input: Input) {
        self.queue.push_back(input);
    }

    pub fn output(&self) -> &[Output] {
        &self.written
    }

    pub fn styled(&self, style: OutputStyle) -> Vec<&str> {
        self.written
            .iter()
            .filter(|o| o.style == style)
            .map(|o| o.text.as_str())
            .collect()
    }

    pub fn errors(&self) -> Vec<&str> {
        self.styled(OutputStyle::Error)
    }

    pub fn lines_containing(&self, needle: &str) -> Vec<&str> {
        self.written
            .iter()
            .map(|o| o.text.as_str())
            .filter(|text| text.contains(needle))
            .collect()
    }

    pub fn last_prompt(&self) -> Option<&PromptConfig> {
        self.prompts.last()
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl IoHost for TestHost {
    fn read(&mut self) -> Result<Input, IoError> {
        Ok(self.queue.pop_front().unwrap_or(Input::Eof))
    }

    fn write(&mut self, output: Output) -> Result<(), IoError> {
        self.written.push(output);
        Ok(())
    }

    fn set_prompt(&mut self, prompt: PromptConfig) -> Result<(), IoError> {
        self.prompts.push(prompt);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), IoError> {
        self.flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_follow_queue_order_then_eof() {
        let mut host = TestHost::new();
        host.queue_input("ls");
        host.queue_key(Input::Interrupt);

        assert_eq!(host.read().unwrap(), Input::Line("ls".to_string()));
        assert_eq!(host.read().unwrap(), Input::Interrupt);
        assert_eq!(host.read().unwrap(), Input::Eof);
        assert_eq!(host.read().unwrap(), Input::Eof);
    }

    #[test]
    fn output_is_filtered_by_style() {
        let mut host = TestHost::new();
        host.write(Output::normal("one")).unwrap();
        host.write(Output::error("two")).unwrap();
        host.write(Output::info("three")).unwrap();

        assert_eq!(host.errors(), vec!["two"]);
        assert_eq!(host.styled(OutputStyle::Info), vec!["three"]);
        assert_eq!(host.lines_containing("t"), vec!["two", "three"]);
        assert_eq!(host.output().len(), 3);
    }

    #[test]
    fn prompts_and_flushes_are_recorded() {
        let mut host = TestHost::new();
        host.set_prompt(PromptConfig {
            language: "python".to_string(),
            ..PromptConfig::default()
        })
        .unwrap();
        host.flush().unwrap();

        assert_eq!(host.last_prompt().map(|p| p.language.as_str()), Some("python"));
        assert_eq!(host.flushes(), 1);
    }
}
