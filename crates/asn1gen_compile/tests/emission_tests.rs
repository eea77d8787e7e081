//! Emission-level properties checked on whole generated files.

use asn1gen_compile::{Backend, Pyasn1Backend, QuickDerBackend};
use asn1gen_language::{build_semantic_model, parse_asn1};

fn pyasn1_output(source: &str) -> String {
    let tree = parse_asn1(source).expect("parse failed");
    let modules = build_semantic_model(&tree).expect("sema failed");
    let mut out = Vec::new();
    Pyasn1Backend::new(&modules[0], &mut out, &modules)
        .generate_code()
        .expect("codegen failed");
    String::from_utf8(out).unwrap()
}

fn quickder_output(source: &str) -> String {
    let tree = parse_asn1(source).expect("parse failed");
    let modules = build_semantic_model(&tree).expect("sema failed");
    let mut out = Vec::new();
    QuickDerBackend::new(&modules[0], &mut out, &modules)
        .generate_code()
        .expect("codegen failed");
    String::from_utf8(out).unwrap()
}

/// Emitted declaration names equal the originals after sanitization only:
/// hyphens to underscores, keywords with a trailing underscore.
#[test]
fn identifier_round_trip_through_sanitization() {
    let output = pyasn1_output(
        "M DEFINITIONS ::= BEGIN
            Key-Usage ::= BIT STRING { digital-signature(0) }
            pass INTEGER ::= 1
            plain-value INTEGER ::= 2
        END",
    );
    assert!(output.contains("class Key_Usage(univ.BitString):"));
    assert!(output.contains("pass_ = univ.Integer(1)"));
    assert!(output.contains("plain_value = univ.Integer(2)"));
    // Named bits keep their source spelling inside string literals.
    assert!(output.contains("('digital-signature', 0)"));
}

/// Within an emission, no definition references a class that has not been
/// declared on an earlier line.
#[test]
fn no_definition_precedes_its_declaration() {
    let output = pyasn1_output(
        "M DEFINITIONS ::= BEGIN
            Tree ::= SEQUENCE { label Label, children Forest }
            Forest ::= SEQUENCE OF Tree
            Label ::= PrintableString
        END",
    );
    for class_name in ["Tree", "Forest", "Label"] {
        let declaration = output
            .find(&format!("class {}(", class_name))
            .expect("declaration missing");
        let first_use = output
            .find(&format!("{}()", class_name))
            .or_else(|| output.find(&format!("{}.componentType", class_name)));
        if let Some(first_use) = first_use {
            assert!(
                declaration < first_use,
                "{} used before its declaration",
                class_name
            );
        }
    }
}

#[test]
fn mutually_recursive_cluster_declares_both_before_defining() {
    let output = pyasn1_output(
        "M DEFINITIONS ::= BEGIN
            Expr ::= CHOICE { atom INTEGER, pair Pair }
            Pair ::= SEQUENCE { left Expr, right Expr }
        END",
    );
    let last_declaration = ["Expr", "Pair"]
        .iter()
        .map(|name| output.find(&format!("class {}(", name)).unwrap())
        .max()
        .unwrap();
    let first_definition = ["Expr", "Pair"]
        .iter()
        .filter_map(|name| output.find(&format!("{}.componentType", name)))
        .min()
        .unwrap();
    assert!(last_declaration < first_definition);
}

/// After tag resolution, no CHOICE or ANY inner type carries an implicit
/// tag in the emitted code.
#[test]
fn no_implicit_tag_survives_on_open_types() {
    let output = pyasn1_output(
        "M DEFINITIONS IMPLICIT TAGS ::= BEGIN
            A ::= [0] CHOICE { a INTEGER, b BOOLEAN }
            B ::= [1] ANY
            C ::= [2] INTEGER
        END",
    );
    let for_class = |name: &str| {
        let start = output.find(&format!("{}.tagSet", name)).unwrap();
        output[start..].lines().next().unwrap().to_string()
    };
    assert!(for_class("A").contains("tagExplicitly"));
    assert!(for_class("B").contains("tagExplicitly"));
    assert!(for_class("C").contains("tagImplicitly"));
}

#[test]
fn quick_der_identifiers_round_trip_too() {
    let output = quickder_output(
        "My-Proto DEFINITIONS ::= BEGIN
            Key-Info ::= SEQUENCE { key-data OCTET STRING }
        END",
    );
    assert!(output.contains("typedef struct {"));
    assert!(output.contains("dercursor key_data;"));
    assert!(output.contains("} My_Proto_Key_Info_ovly;"));
    assert!(output.contains("#define DER_PACK_My_Proto_Key_Info \\"));
}

#[test]
fn both_backends_accept_the_same_module() {
    let source = "LDAP-Lite DEFINITIONS ::= BEGIN
        MessageID ::= INTEGER (0..2147483647)
        LDAPString ::= OCTET STRING
        LDAPResult ::= SEQUENCE {
            resultCode ENUMERATED { success(0), operationsError(1) },
            matchedDN LDAPString,
            diagnosticMessage LDAPString
        }
    END";
    let python = pyasn1_output(source);
    let header = quickder_output(source);
    assert!(python.contains("class LDAPResult(univ.Sequence):"));
    assert!(python.contains("constraint.ValueRangeConstraint(0, 2147483647)"));
    assert!(header.contains("#define DER_PACK_LDAP_Lite_LDAPResult \\"));
    assert!(header.contains("DER_PACK_LDAP_Lite_LDAPString"));
}
