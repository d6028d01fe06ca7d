use std::path::Path;
use std::path::PathBuf;

use crate::DocumentationBlock;
use crate::ElementKind;
use crate::TagPolicy;

pub(crate) const SINCE_AT_END: &str = r#"
tag-rules:
  - tag: since
    value: "1.0.0"
    insertPosition: end
"#;

pub(crate) const GREETER_POLICY: &str = r#"
tag-rules:
  - tag: author
    value: "{{ vars.team }}"
    insertPosition: beginning
  - tag: since
    value: "1.0.0"
    insertPosition: end
    overwrite: ifLower
variables:
  team: core
"#;

pub(crate) const GREETER_SOURCE: &str = r"package com.example;

/**
 * A greeter.
 */
public class Greeter {
    /** The greeting. */
    private final String greeting;

    /**
     * Creates a greeter.
     *
     * @param greeting the greeting
     */
    public Greeter(String greeting) {
        this.greeting = greeting;
    }

    /**
     * Greets someone.
     *
     * @param name who to greet
     * @return the greeting
     */
    public String greet(String name) {
        return greeting + name;
    }
}
";

pub(crate) const GREETER_EXPECTED: &str = r"package com.example;

/**
 * A greeter.
 * @author core
 * @since 1.0.0
 */
public class Greeter {
    /** The greeting.
     * @since 1.0.0
     */
    private final String greeting;

    /**
     * Creates a greeter.
     *
     * @param greeting the greeting
     * @since 1.0.0
     */
    public Greeter(String greeting) {
        this.greeting = greeting;
    }

    /**
     * Greets someone.
     *
     * @param name who to greet
     * @return the greeting
     * @since 1.0.0
     */
    public String greet(String name) {
        return greeting + name;
    }
}
";

pub(crate) const COLOR_SOURCE: &str = r#"/** Colors. */
public enum Color {
    /** Red. */
    @Deprecated
    RED("r"),
    /** Green. */
    GREEN,
    /** Blue. */
    BLUE;

    /** The code. */
    private String code;

    /** Looks up a color. */
    public static Color of(String code) {
        String marker = "/** not a block */";
        // /** not a block either */
        return RED;
    }
}
"#;

pub(crate) fn policy(yaml: &str) -> TagPolicy {
	TagPolicy::from_yaml(yaml).unwrap_or_else(|e| panic!("invalid test policy: {e}"))
}

pub(crate) fn block(text: &str, element: ElementKind) -> DocumentationBlock {
	DocumentationBlock::parse(text, element)
}

pub(crate) fn write_file(root: &Path, relative: &str, content: &str) -> PathBuf {
	let path = root.join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create {parent:?}: {e}"));
	}
	std::fs::write(&path, content).unwrap_or_else(|e| panic!("write {path:?}: {e}"));
	path
}
