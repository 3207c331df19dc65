use jack::prelude::*;

#[test]
fn test_compile_seven() {
    let source = include_str!("Seven.jack");
    let expected = include_str!("Seven.vm");

    match jack::compile(source) {
        Ok(vm) => assert_eq!(vm, expected),
        Err(err) => panic!("{}", err),
    }
}

#[test]
fn test_compile_counter() {
    let source = include_str!("Counter.jack");
    let expected = include_str!("Counter.vm");

    match jack::compile(source) {
        Ok(vm) => {
            for (line, (actual, expected)) in vm.lines().zip(expected.lines()).enumerate() {
                assert_eq!(actual, expected, "instruction {}", line + 1);
            }
            assert_eq!(vm.lines().count(), expected.lines().count());
        }
        Err(err) => panic!("{}", err),
    }
}

#[test]
fn test_compile_to_writer() {
    let out = jack::compile_to(include_str!("Seven.jack"), CompileConf::default(), Vec::new()).unwrap();
    assert_eq!(out, include_bytes!("Seven.vm"));
}

#[test]
fn test_error_report() {
    let source = "class Main {\n    function void main() {\n        do Output.printInt(1 +);\n    }\n}\n";

    match jack::compile(source) {
        Err(JackError::Syntax(err)) => {
            assert_eq!((err.line, err.column), (3, 31));
            assert_eq!(
                err.to_string(),
                concat!(
                    "3:31: expected a term, found `)`\n",
                    "            do Output.printInt(1 +);\n",
                    "                                  ^",
                )
            );
        }
        other => panic!("expected syntax error, got {other:?}"),
    }
}

#[test]
fn test_strict_declarations() {
    let source = "class Main { static int a; static boolean a; }";

    assert!(jack::compile(source).is_ok());

    let conf = CompileConf {
        strict_declarations: true,
    };
    assert!(matches!(
        jack::compile_with(source, conf),
        Err(JackError::DuplicateSymbol(_))
    ));
}

#[test]
fn test_token_dump() {
    let out = jack::xml::write_tokens("class Main { }", Vec::new()).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "<tokens>\n<keyword> class </keyword>\n<identifier> Main </identifier>\n<symbol> { </symbol>\n<symbol> } </symbol>\n</tokens>\n"
    );
}

#[test]
fn test_parse_tree_seven() {
    let source = include_str!("Seven.jack");
    let expected = include_str!("Seven.xml");

    match jack::xml::write_parse_tree(source, Vec::new()) {
        Ok(out) => {
            let xml = String::from_utf8(out).unwrap();
            for (line, (actual, expected)) in xml.lines().zip(expected.lines()).enumerate() {
                assert_eq!(actual, expected, "line {}", line + 1);
            }
            assert_eq!(xml.lines().count(), expected.lines().count());
        }
        Err(err) => panic!("{}", err),
    }
}

#[test]
fn test_parse_tree_counter() {
    let source = include_str!("Counter.jack");
    let xml = String::from_utf8(jack::xml::write_parse_tree(source, Vec::new()).unwrap()).unwrap();

    assert!(xml.starts_with("<class>\n  <keyword> class </keyword>\n"));
    assert!(xml.ends_with("  <symbol> } </symbol>\n</class>\n"));

    // Every opened rule element is closed at the same depth.
    let mut open: Vec<(usize, &str)> = vec![];
    for line in xml.lines() {
        let indent = line.len() - line.trim_start().len();
        let tag = line.trim_start();
        if let Some(name) = tag.strip_prefix("</") {
            let (depth, opened) = open.pop().expect("close without open");
            assert_eq!((depth, opened), (indent, name.trim_end_matches('>')));
        } else if !tag.contains("</") {
            open.push((indent, tag.trim_start_matches('<').trim_end_matches('>')));
        }
    }
    assert!(open.is_empty());
}
