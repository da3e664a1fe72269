//! Terminal echo: print each plain-text notice for copy/paste.

use dunning_shared::{Notice, Recipients, Result};

use super::Sink;
use crate::prompt::ChoiceSource;

const RULE_WIDTH: usize = 80;

pub struct TerminalSink {
    cc: Recipients,
}

impl TerminalSink {
    pub fn new(cc: Recipients) -> Self {
        Self { cc }
    }
}

impl Sink for TerminalSink {
    fn name(&self) -> &str {
        "terminal"
    }

    fn deliver(
        &mut self,
        notice: &Notice,
        address: &str,
        source: &mut dyn ChoiceSource,
    ) -> Result<()> {
        let rule = "=".repeat(RULE_WIDTH);
        source.show("");
        source.show(&rule);
        source.show(&format!("EMAIL FOR: {}", notice.customer));
        source.show(&format!("TO: {address}"));
        source.show(&format!("CC: {}", self.cc.for_mime()));
        source.show(&format!("SUBJECT: {}", notice.subject));
        source.show(&rule);
        for line in notice.plain.lines() {
            source.show(line);
        }
        source.show(&rule);
        source.show("");
        source.ask("Press Enter to continue to next customer...")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::deliver_all;
    use crate::delivery::tests::notice;
    use crate::pipeline::SilentProgress;
    use crate::prompt::ScriptedChoices;

    #[test]
    fn pauses_between_customers() {
        let mut sink = TerminalSink::new(Recipients::parse("ar@rana.test"));
        let mut source = ScriptedChoices::new(["", ""]);
        let notices = vec![notice("Acme", Some("a@x.com")), notice("Beta", Some("b@y.com"))];

        let summary =
            deliver_all(&notices, &mut sink, &mut source, &SilentProgress).expect("batch");
        assert_eq!(summary.delivered, 2);
        assert_eq!(source.remaining(), 0);
        assert!(source.saw("EMAIL FOR: Beta"));
        assert!(source.saw("CC: ar@rana.test"));
        assert!(source.saw("SUBJECT: Rana Analytics - Acme Account Overdue Notice"));
    }
}
