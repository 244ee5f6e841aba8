use std::sync::Arc;

use alnbench_seq::{BioString, ClosedRange, Grammar, ParentSeq, Subseq};

fn parent(seq: &str) -> Arc<ParentSeq> {
    Arc::new(ParentSeq::new(BioString::new(seq, Grammar::Amino)))
}

fn subseq(parent_seq: &str, gapped: &str) -> Subseq {
    let mut s = Subseq::new(parent(parent_seq));
    assert!(s.set_gapped(BioString::new(gapped, Grammar::Amino)));
    s
}

fn window_invariant_holds(s: &Subseq) -> bool {
    let window = s
        .parent()
        .seq()
        .mid(ClosedRange::new(s.start(), s.stop()));
    s.gapped().ungapped() == window && s.ungapped_length() == s.stop() - s.start() + 1
}

#[test]
fn new_covers_whole_parent() {
    let s = Subseq::new(parent("ABCDEF"));
    assert_eq!(s.gapped(), &"ABCDEF");
    assert_eq!(s.start(), 1);
    assert_eq!(s.stop(), 6);
    assert_eq!(s.ungapped_length(), 6);
    assert!(!s.is_modified());
    assert!(window_invariant_holds(&s));
}

#[test]
fn set_gapped_snaps_to_parent_window() {
    let mut s = Subseq::new(parent("ABCDEF"));
    assert!(s.set_gapped(BioString::new("-C---D-", Grammar::Amino)));
    assert_eq!(s.start(), 3);
    assert_eq!(s.stop(), 4);
    assert_eq!(s.head_gaps(), 1);
    assert_eq!(s.tail_gaps(), 1);
    assert!(window_invariant_holds(&s));

    // Content absent from the parent is rejected and changes nothing
    assert!(!s.set_gapped(BioString::new("XY", Grammar::Amino)));
    assert_eq!(s.gapped(), &"-C---D-");

    // A window of pure gaps is rejected
    assert!(!s.set_gapped(BioString::new("---", Grammar::Amino)));
}

#[test]
fn set_start_moving_left_consumes_leading_gaps() {
    let mut s = subseq("ABCDEF", "-C---DE--");
    assert!(s.set_start(2));
    assert_eq!(s.gapped(), &"BC---DE--");
    assert_eq!(s.start(), 2);
    assert!(window_invariant_holds(&s));
}

#[test]
fn set_start_moving_left_grows_when_gaps_run_out() {
    let mut s = subseq("ABCDEF", "-C---DE--");
    assert!(s.set_start(1));
    assert_eq!(s.gapped(), &"ABC---DE--");
    assert_eq!(s.start(), 1);
    assert_eq!(s.stop(), 5);
    assert!(window_invariant_holds(&s));
}

#[test]
fn set_start_moving_right_gaps_out_residues() {
    let mut s = subseq("ABCDEF", "-C---DE--");
    assert!(s.set_start(4));
    assert_eq!(s.gapped(), &"-----DE--");
    assert_eq!(s.start(), 4);
    assert!(window_invariant_holds(&s));

    // Moving back left re-reads the parent residues
    assert!(s.set_start(1));
    assert_eq!(s.gapped(), &"--ABCDE--");
    assert!(window_invariant_holds(&s));
}

#[test]
fn set_start_beyond_stop_collapses_window() {
    let mut s = subseq("ABCDEF", "-C---DE--");
    assert!(s.set_start(6));
    assert_eq!(s.gapped(), &"-------F-");
    assert_eq!(s.start(), 6);
    assert_eq!(s.stop(), 6);
    assert!(window_invariant_holds(&s));
}

#[test]
fn set_start_out_of_parent_bounds_is_rejected() {
    let mut s = subseq("ABCDEF", "-C---DE--");
    assert!(!s.set_start(0));
    assert!(!s.set_start(7));
    assert_eq!(s.gapped(), &"-C---DE--");
    assert_eq!(s.start(), 3);
}

#[test]
fn set_stop_moving_right_consumes_trailing_gaps() {
    let mut s = subseq("ABCDEF", "-C---DE--");
    assert!(s.set_stop(6));
    assert_eq!(s.gapped(), &"-C---DEF-");
    assert_eq!(s.stop(), 6);
    assert!(window_invariant_holds(&s));
}

#[test]
fn set_stop_moving_right_grows_when_gaps_run_out() {
    let mut s = subseq("ABCDEF", "-C---DE.");
    assert!(s.set_stop(6));
    assert_eq!(s.gapped(), &"-C---DEF");
    assert_eq!(s.stop(), 6);
    assert!(window_invariant_holds(&s));
}

#[test]
fn set_stop_moving_left_gaps_out_residues() {
    let mut s = subseq("ABCDEF", "-C---DE--");
    assert!(s.set_stop(3));
    assert_eq!(s.gapped(), &"-C-------");
    assert_eq!(s.stop(), 3);
    assert!(window_invariant_holds(&s));

    assert!(s.set_stop(6));
    assert_eq!(s.gapped(), &"-CDEF----");
    assert!(window_invariant_holds(&s));
}

#[test]
fn set_stop_beyond_start_collapses_window() {
    let mut s = subseq("ABCDEF", "-C---DE--");
    assert!(s.set_stop(1));
    assert_eq!(s.gapped(), &"A---------");
    assert_eq!(s.start(), 1);
    assert_eq!(s.stop(), 1);
    assert!(window_invariant_holds(&s));
}

#[test]
fn move_start_clamps_to_parent() {
    let mut s = subseq("ABCDEF", "-C---D-");
    assert_eq!(s.move_start(-1), 1);
    assert_eq!(s.gapped(), &"BC---D-");
    assert_eq!(s.start(), 2);

    let mut s = subseq("ABCDEF", "-C---D-");
    assert_eq!(s.move_start(-5), 2);
    assert_eq!(s.gapped(), &"ABC---D-");
    assert_eq!(s.start(), 1);

    let mut s = subseq("ABCDEF", "-C---D-");
    assert_eq!(s.move_start(1), 1);
    assert_eq!(s.gapped(), &"-----D-");

    let mut s = subseq("ABCDEF", "-C---D-");
    assert_eq!(s.move_start(2), 2);
    assert_eq!(s.gapped(), &"------E");
    assert_eq!(s.start(), 5);
    assert_eq!(s.stop(), 5);

    let mut s = subseq("ABCDEF", "-C---D-");
    assert_eq!(s.move_start(0), 0);
    assert_eq!(s.gapped(), &"-C---D-");
}

#[test]
fn move_stop_clamps_to_parent() {
    let mut s = subseq("ABCDEF", "-C---D-");
    assert_eq!(s.move_stop(1), 1);
    assert_eq!(s.gapped(), &"-C---DE");

    let mut s = subseq("ABCDEF", "-C---D-");
    assert_eq!(s.move_stop(7), 2);
    assert_eq!(s.gapped(), &"-C---DEF");
    assert_eq!(s.stop(), 6);

    let mut s = subseq("ABCDEF", "-C---D-");
    assert_eq!(s.move_stop(-1), 1);
    assert_eq!(s.gapped(), &"-C-----");

    let mut s = subseq("ABCDEF", "-C---D-");
    assert_eq!(s.move_stop(-2), 2);
    assert_eq!(s.gapped(), &"B------");
    assert_eq!(s.start(), 2);
    assert_eq!(s.stop(), 2);
}

#[test]
fn gap_edits_leave_boundaries_alone() {
    let mut s = subseq("ABCDEF", "-C---DE--");
    s.insert_gaps(2, 2, b'.');
    assert_eq!(s.gapped(), &"-..C---DE--");
    assert_eq!(s.start(), 3);
    assert_eq!(s.stop(), 5);

    s.remove_gaps(2, 2);
    assert_eq!(s.gapped(), &"-C---DE--");
    assert_eq!(s.start(), 3);

    let moved = s.slide(ClosedRange::new(6, 7), -2);
    assert_eq!(moved, -2);
    assert_eq!(s.gapped(), &"-C-DE----");
    assert_eq!(s.start(), 3);
    assert_eq!(s.stop(), 5);
    assert!(window_invariant_holds(&s));

    let affected = s.collapse_left(ClosedRange::new(1, 9));
    assert_eq!(s.gapped(), &"CDE------");
    assert_eq!(affected, Some(ClosedRange::new(1, 5)));
    assert!(window_invariant_holds(&s));
}

#[test]
fn rearrange_gaps_requires_same_residues() {
    let mut s = subseq("ABCDEF", "-C---DE--");
    assert!(s.rearrange_gaps(BioString::new("C---D--E-", Grammar::Amino)));
    assert_eq!(s.gapped(), &"C---D--E-");
    assert_eq!(s.start(), 3);

    // Different residue content is refused
    assert!(!s.rearrange_gaps(BioString::new("C---D--F-", Grammar::Amino)));
    // As is a different length
    assert!(!s.rearrange_gaps(BioString::new("C---D--E", Grammar::Amino)));
    assert_eq!(s.gapped(), &"C---D--E-");
}

#[test]
fn labels_and_modified_flag() {
    let mut s = Subseq::new(parent("ABCDEF"));
    assert_eq!(s.label(), "");
    s.set_label("sp|P12345");
    assert_eq!(s.label(), "sp|P12345");

    assert!(!s.is_modified());
    s.insert_gaps(1, 1, b'-');
    assert!(s.is_modified());
    s.set_modified(false);
    assert!(!s.is_modified());
}

#[test]
fn parent_digest_addresses_content() {
    let a = parent("AB-CDEF");
    let b = parent("ABCDEF");
    assert_eq!(a.digest(), b.digest());
    assert_eq!(a.len(), 6);
}
