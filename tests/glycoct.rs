use std::collections::HashSet;

use anyhow::Result;
use glycan::*;

const LACTOSE: &str = "RES
1b:b-dglc-HEX-1:5
2b:b-dgal-HEX-1:5
LIN
1:1o(4+1)2d
";

/// A glucose carrying a chain of cellobiose units with the given bounds.
fn cellulose(lower: i64, upper: i64) -> String {
    format!(
        "RES
1b:x-dglc-HEX-1:5
2r:r1
LIN
1:1o(4+1)2d
REP
REP1:4o(4+1)3d={lower}-{upper}
RES
3b:b-dglc-HEX-1:5
4b:b-dgal-HEX-1:5
LIN
2:3o(4+1)4d
"
    )
}

fn ids(glycan: &Glycan) -> HashSet<u64> {
    glycan
        .nodes()
        .filter_map(|(_, node)| node.id.global())
        .collect()
}

fn stem(glycan: &Glycan, ix: petgraph::stable_graph::NodeIndex) -> Stem {
    glycan.node(ix).as_monosaccharide().unwrap().stem[0]
}

#[test]
fn minimal_document() -> Result<()> {
    let glycan = parse_glycoct("RES\n1b:o-dman-HEX-0:0\nLIN\n")?;
    assert_eq!(glycan.len(), 1);
    assert_eq!(glycan.link_count(), 0);

    let root = glycan.root_node().as_monosaccharide().unwrap();
    assert_eq!(root.anomer, Anomer::Uncyclized);
    assert_eq!(root.stem, vec![Stem::Man]);
    assert_eq!(root.configuration, vec![Configuration::D]);
    assert_eq!(root.superclass, SuperClass::Hex);
    assert_eq!(root.ring_start, Some(0));
    assert_eq!(root.ring_end, Some(0));
    Ok(())
}

#[test]
fn identifiers_are_unique_across_parses() -> Result<()> {
    let first = parse_glycoct(&cellulose(2, 4))?;
    let second = parse_glycoct(&cellulose(2, 4))?;
    let (a, b) = (ids(&first), ids(&second));
    assert_eq!(a.len(), first.len());
    assert_eq!(b.len(), second.len());
    assert!(a.is_disjoint(&b));
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn multi_document_stream() -> Result<()> {
    let text = format!("{LACTOSE}{LACTOSE}");
    let glycans = GlycoctReader::from_text(&text).collect::<glycan::Result<Vec<_>>>()?;
    assert_eq!(glycans.len(), 2);
    for glycan in &glycans {
        assert_eq!(glycan.len(), 2);
        assert_eq!(stem(glycan, glycan.root()), Stem::Glc);
    }
    assert!(ids(&glycans[0]).is_disjoint(&ids(&glycans[1])));

    match loads(&text)? {
        Loaded::Many(glycans) => assert_eq!(glycans.len(), 2),
        Loaded::One(_) => panic!("expected two documents"),
    }
    assert!(matches!(loads(LACTOSE)?, Loaded::One(_)));
    Ok(())
}

#[test]
fn repeat_counts_follow_bounds() -> Result<()> {
    for ((lower, upper), copies) in [((2, 4), 4), ((-1, 3), 3), ((2, -1), 2), ((-1, -1), 1)] {
        let glycan = parse_glycoct(&cellulose(lower, upper))?;
        assert_eq!(glycan.len(), 1 + 2 * copies, "bounds {lower}-{upper}");
        // One external link, one internal link per copy, and the joins.
        assert_eq!(glycan.link_count(), 1 + copies + (copies - 1));
    }
    Ok(())
}

#[test]
fn repeat_copies_are_chained() -> Result<()> {
    let glycan = parse_glycoct(&cellulose(3, 3))?;
    // Walk the chain from the root: glc, then glc/gal pairs.
    let mut node = glycan.root();
    let mut stems = vec![stem(&glycan, node)];
    while let Some((child, link)) = glycan.children(node).into_iter().next() {
        assert_eq!(link.parent_position, Some(4));
        assert_eq!(link.child_position, Some(1));
        stems.push(stem(&glycan, child));
        node = child;
    }
    assert_eq!(
        stems,
        vec![Stem::Glc, Stem::Glc, Stem::Gal, Stem::Glc, Stem::Gal, Stem::Glc, Stem::Gal]
    );
    Ok(())
}

#[test]
fn requested_repeat_count() -> Result<()> {
    let options = ReaderOptions::default().repeat_count(3);
    let glycans = loads_with(&cellulose(2, 4), options)?.into_vec();
    assert_eq!(glycans[0].len(), 7);

    let err = loads_with(&cellulose(2, 4), ReaderOptions::default().repeat_count(5)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Range);

    // Unbounded above, so any positive count is accepted.
    let glycans = loads_with(&cellulose(2, -1), options)?.into_vec();
    assert_eq!(glycans[0].len(), 7);
    Ok(())
}

#[test]
fn deferred_links_replay_in_declaration_order() -> Result<()> {
    let text = "RES
1r:r1
2b:b-dgal-HEX-1:5
3b:b-dman-HEX-1:5
LIN
1:1o(3|6+1)2d
2:1o(3|6+1)3d
REP
REP1:11o(4+1)10d=1-1
RES
10b:b-dglc-HEX-1:5
11b:b-dglc-HEX-1:5
LIN
3:10o(4+1)11d
";
    let glycan = parse_glycoct(text)?;
    assert_eq!(glycan.len(), 4);

    let root = glycan.root();
    assert_eq!(stem(&glycan, root), Stem::Glc);
    let (exit, _) = glycan.children(root)[0];
    let children: Vec<_> = glycan
        .children(exit)
        .into_iter()
        .map(|(child, link)| (link.parent_position, stem(&glycan, child)))
        .collect();
    assert_eq!(children, vec![(Some(3), Stem::Gal), (Some(6), Stem::Man)]);

    // Swapping the two lines swaps the attachments.
    let swapped = text
        .replace("1:1o(3|6+1)2d", "1:1o(3|6+1)3d")
        .replacen("2:1o(3|6+1)3d", "2:1o(3|6+1)2d", 1);
    let glycan = parse_glycoct(&swapped)?;
    let (exit, _) = glycan.children(glycan.root())[0];
    let children: Vec<_> = glycan
        .children(exit)
        .into_iter()
        .map(|(child, link)| (link.parent_position, stem(&glycan, child)))
        .collect();
    assert_eq!(children, vec![(Some(3), Stem::Man), (Some(6), Stem::Gal)]);
    Ok(())
}

#[test]
fn links_between_repeats() -> Result<()> {
    let text = "RES
1r:r1
2r:r2
LIN
1:1o(3+1)2d
REP
REP1:3o(4+1)3d=2-2
RES
3b:b-dglc-HEX-1:5
REP2:4o(6+1)4d=3-3
RES
4b:a-dman-HEX-1:5
";
    let glycan = parse_glycoct(text)?;
    assert_eq!(glycan.len(), 5);
    assert_eq!(glycan.link_count(), 4);
    let mans = glycan
        .nodes()
        .filter(|(ix, _)| stem(&glycan, *ix) == Stem::Man)
        .count();
    assert_eq!(mans, 3);
    Ok(())
}

#[test]
fn document_opening_with_a_repeat() -> Result<()> {
    let glycan = parse_glycoct(
        "RES
1r:r1
LIN
REP
REP1:3o(4+1)2d=2-2
RES
2b:b-dglc-HEX-1:5
3b:b-dglc-HEX-1:5
LIN
1:2o(4+1)3d
",
    )?;
    assert_eq!(glycan.len(), 4);
    assert_eq!(glycan.link_count(), 3);
    assert_eq!(glycan.leaves().len(), 1);
    assert!(glycan.parents(glycan.root()).is_empty());
    Ok(())
}

#[test]
fn ambiguous_link_takes_first_open_position() -> Result<()> {
    let glycan = parse_glycoct(
        "RES
1b:b-dglc-HEX-1:5
2b:b-dgal-HEX-1:5
3b:b-dgal-HEX-1:5
4b:b-dgal-HEX-1:5
5b:a-lgal-HEX-1:5|6:d
LIN
1:1o(2+1)2d
2:1o(3+1)3d
3:1o(4+1)4d
4:1o(3|4|5+1)5d
",
    )?;
    let positions: Vec<_> = glycan
        .children(glycan.root())
        .into_iter()
        .map(|(_, link)| link.parent_position)
        .collect();
    assert_eq!(positions, vec![Some(2), Some(3), Some(4), Some(5)]);
    Ok(())
}

#[test]
fn ambiguous_link_without_open_position() {
    let err = parse_glycoct(
        "RES
1b:b-dglc-HEX-1:5
2b:b-dgal-HEX-1:5
3b:b-dgal-HEX-1:5
4b:b-dgal-HEX-1:5
LIN
1:1o(3+1)2d
2:1o(4+1)3d
3:1o(3|4+1)4d
",
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoOpenPosition);
}

#[test]
fn unsupported_sections_are_rejected() {
    for keyword in ["ALT\nALT1\n", "UND\nUND1:100.0:100.0\n"] {
        let text = format!("RES\n1b:b-dglc-HEX-1:5\nLIN\n{keyword}");
        let mut reader = GlycoctReader::from_text(&text);
        match reader.next() {
            Some(Err(err)) => assert!(err.is_unsupported_section(), "{err}"),
            other => panic!("expected an unsupported section, got {other:?}"),
        }
        assert!(reader.next().is_none());
    }
}

#[test]
fn nested_repeats_are_rejected() {
    let err = parse_glycoct(
        "RES
1r:r1
REP
REP1:2o(4+1)2d=2-2
RES
2b:b-dglc-HEX-1:5
3r:r2
",
    )
    .unwrap_err();
    assert!(err.is_unsupported_section());
}

#[test]
fn dangling_reference() {
    let err = parse_glycoct("RES\n1b:b-dglc-HEX-1:5\nLIN\n1:1o(4+1)7d\n").unwrap_err();
    assert!(matches!(err, GlycoctError::UnresolvedReference(7)));
}

#[test]
fn malformed_lines() {
    let err = parse_glycoct("RES\n1b:b-dfoo-HEX-1:5\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
    let err = parse_glycoct("RES\n1b:b-dglc-HEX-1:5\n2z:what\n").unwrap_err();
    assert!(matches!(err, GlycoctError::Format { line: 3, .. }));
}

#[test]
fn substituent_parent_is_permitted() -> Result<()> {
    let glycan = parse_glycoct(
        "RES
1b:b-dglc-HEX-1:5
2s:phosphate
3b:a-dman-HEX-1:5
LIN
1:1o(6+1)2n
2:2n(1+1)3o
",
    )?;
    assert_eq!(glycan.len(), 3);
    assert_eq!(glycan.leaves().len(), 1);
    Ok(())
}

#[test]
fn round_trip_through_text() -> Result<()> {
    let glycan = parse_glycoct(&cellulose(2, 2))?;
    let text = glycan.to_glycoct();
    assert!(!text.contains("REP"));
    let again = parse_glycoct(&text)?;
    assert_eq!(glycan, again);
    assert_eq!(glycan.composition(), again.composition());
    assert_eq!(glycan.composition().get("dgal-HEX"), 2);
    Ok(())
}

#[test]
fn equality_ignores_declaration_order() -> Result<()> {
    let text = |second: &str, third: &str| {
        format!(
            "RES\n1b:b-dglc-HEX-1:5\n2b:{second}\n3b:{third}\nLIN\n1:1o(-1+1)2d\n2:1o(-1+1)3d\n"
        )
    };
    let gal = "b-dgal-HEX-1:5";
    let man = "a-dman-HEX-1:5";
    let a = parse_glycoct(&text(gal, man))?;
    let b = parse_glycoct(&text(man, gal))?;
    assert_eq!(a.composition(), b.composition());
    assert_eq!(a, b);
    assert_eq!(a.to_glycoct(), b.to_glycoct());
    Ok(())
}
