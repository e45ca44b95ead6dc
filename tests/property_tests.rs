// Property-based tests for the sshd directive rewriter.
//
// The rewriter is the one piece of this tool that edits a file it does not
// own the format of, so its invariants get property coverage: applying a
// rewrite twice must equal applying it once, every governed directive must
// end up active exactly once, and unrelated lines must survive untouched.

use proptest::prelude::*;

use server_bootstrap::sshd_config::SshdConfig;

/// Lines resembling what real sshd_config files contain: active directives,
/// commented-out directives, prose comments, blanks, and oddballs.
fn config_line() -> impl Strategy<Value = String> {
    let fixed = prop::sample::select(vec![
        "Port 22",
        "PermitRootLogin yes",
        "#PermitRootLogin prohibit-password",
        "PasswordAuthentication yes",
        "#PasswordAuthentication no",
        "ChallengeResponseAuthentication yes",
        "UsePAM no",
        "#UsePAM yes",
        "X11Forwarding no",
        "AllowUsers deploy ops",
        "# This is a prose comment about the file",
        "",
        "   Banner /etc/issue.net",
    ])
    .prop_map(str::to_string);

    prop_oneof![
        4 => fixed,
        1 => "[A-Z][a-zA-Z]{2,12} [a-z0-9/._-]{1,12}",
    ]
}

fn config_text() -> impl Strategy<Value = String> {
    prop::collection::vec(config_line(), 0..24).prop_map(|lines| {
        let mut text = lines.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        text
    })
}

const GOVERNED: &[(&str, &str)] = &[
    ("PermitRootLogin", "no"),
    ("PasswordAuthentication", "no"),
    ("ChallengeResponseAuthentication", "no"),
    ("UsePAM", "yes"),
];

fn apply_hardening(text: &str, username: &str) -> String {
    let mut cfg = SshdConfig::parse(text);
    for (keyword, value) in GOVERNED {
        cfg.set(keyword, value);
    }
    cfg.allow_user(username);
    cfg.to_string()
}

proptest! {
    // Rewriting twice must produce the same file as rewriting once
    #[test]
    fn prop_rewrite_is_idempotent(text in config_text()) {
        let once = apply_hardening(&text, "alice");
        let twice = apply_hardening(&once, "alice");
        prop_assert_eq!(once, twice);
    }

    // Every governed directive is active exactly once after a rewrite
    #[test]
    fn prop_each_directive_active_exactly_once(text in config_text()) {
        let cfg = SshdConfig::parse(&apply_hardening(&text, "alice"));
        for (keyword, value) in GOVERNED {
            prop_assert_eq!(cfg.active_count(keyword), 1, "directive {}", keyword);
            prop_assert_eq!(cfg.get_active(keyword), Some(*value));
        }
    }

    // The allow-list contains the hardened account exactly once
    #[test]
    fn prop_allow_list_contains_user_exactly_once(text in config_text()) {
        let cfg = SshdConfig::parse(&apply_hardening(&text, "alice"));
        let count = cfg
            .allowed_users()
            .iter()
            .filter(|u| u.as_str() == "alice")
            .count();
        prop_assert_eq!(count, 1);
        prop_assert_eq!(cfg.active_count("AllowUsers"), 1);
    }

    // Prior allow-list entries survive a rewrite for a different account
    #[test]
    fn prop_allow_list_is_additive(text in config_text()) {
        let first = apply_hardening(&text, "alice");
        let second = apply_hardening(&first, "bob");
        let cfg = SshdConfig::parse(&second);
        let users = cfg.allowed_users();
        prop_assert!(users.iter().any(|u| u == "alice"));
        prop_assert!(users.iter().any(|u| u == "bob"));
    }

    // Lines that carry no governed directive are preserved verbatim, in order
    #[test]
    fn prop_unrelated_lines_preserved(text in config_text()) {
        let governed_keywords = ["permitrootlogin", "passwordauthentication",
            "challengeresponseauthentication", "usepam", "allowusers"];
        let is_unrelated = |line: &str| {
            let body = line.trim_start().trim_start_matches('#').trim_start();
            let keyword = body.split_whitespace().next().unwrap_or("");
            !governed_keywords.contains(&keyword.to_ascii_lowercase().as_str())
        };

        let before: Vec<&str> = text.lines().filter(|l| is_unrelated(l)).collect();
        let rewritten = apply_hardening(&text, "alice");
        let after: Vec<&str> = rewritten.lines().filter(|l| is_unrelated(l)).collect();

        prop_assert_eq!(before, after);
    }
}
