use std::io::{self, BufRead, Write};

use tracing::warn;

/// `y` or `yes`, in any case.
pub(crate) fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim();

    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

/// Writes `question` to `output` and reads one line of `input` as the answer.
pub(crate) fn ask<R, W>(input: &mut R, output: &mut W, question: &str) -> io::Result<bool>
where
    R: BufRead,
    W: Write,
{
    write!(output, "{question} [y/N] ")?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;

    Ok(is_affirmative(&answer))
}

/// Asks on the terminal. Failing to read an answer counts as "no".
pub(crate) fn confirm(question: &str) -> bool {
    ask(&mut io::stdin().lock(), &mut io::stderr(), question).unwrap_or_else(|error| {
        warn!(%error, "failed to read confirmation");
        false
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("y\n", true)]
    #[case("YES\n", true)]
    #[case(" Yes \n", true)]
    #[case("n\n", false)]
    #[case("yep\n", false)]
    #[case("\n", false)]
    #[case("", false)]
    fn answers(#[case] answer: &str, #[case] accepted: bool) {
        let mut output = Vec::new();

        let confirmed = ask(
            &mut Cursor::new(answer),
            &mut output,
            "Are you sure you want to continue?",
        )
        .unwrap();

        assert_eq!(confirmed, accepted);
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Are you sure you want to continue? [y/N] "
        );
    }
}
