//! Width metrics for the two built-in faces the receipt uses.
//!
//! Helvetica and Helvetica-Bold ship with every PDF viewer, so the file
//! embeds no font data; it only needs advance widths to center and
//! right-align text. The tables below are the Adobe core-14 AFM widths in
//! 1/1000 em for the printable ASCII range (0x20..=0x7E). Characters
//! outside that range are drawn as `?` and measured the same way.

use pdf_writer::Name;

/// Helvetica advance widths for chars 0x20..=0x7E.
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    //  sp    !    "    #    $    %    &    '    (    )
       278, 278, 355, 556, 556, 889, 667, 191, 333, 333,
    //   *    +    ,    -    .    /    0    1    2    3
       389, 584, 278, 333, 278, 278, 556, 556, 556, 556,
    //   4    5    6    7    8    9    :    ;    <    =
       556, 556, 556, 556, 556, 556, 278, 278, 584, 584,
    //   >    ?    @    A    B    C    D    E    F    G
       584, 556, 1015, 667, 667, 722, 722, 667, 611, 778,
    //   H    I    J    K    L    M    N    O    P    Q
       722, 278, 500, 667, 556, 833, 722, 778, 667, 778,
    //   R    S    T    U    V    W    X    Y    Z    [
       722, 667, 611, 722, 667, 944, 667, 667, 611, 278,
    //   \    ]    ^    _    `    a    b    c    d    e
       278, 278, 469, 556, 333, 556, 556, 500, 556, 556,
    //   f    g    h    i    j    k    l    m    n    o
       278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    //   p    q    r    s    t    u    v    w    x    y
       556, 556, 333, 500, 278, 556, 500, 722, 500, 500,
    //   z    {    |    }    ~
       500, 334, 260, 334, 584,
];

/// Helvetica-Bold advance widths for chars 0x20..=0x7E.
#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    //  sp    !    "    #    $    %    &    '    (    )
       278, 333, 474, 556, 556, 889, 722, 238, 333, 333,
    //   *    +    ,    -    .    /    0    1    2    3
       389, 584, 278, 333, 278, 278, 556, 556, 556, 556,
    //   4    5    6    7    8    9    :    ;    <    =
       556, 556, 556, 556, 556, 556, 333, 333, 584, 584,
    //   >    ?    @    A    B    C    D    E    F    G
       584, 611, 975, 722, 722, 722, 722, 667, 611, 778,
    //   H    I    J    K    L    M    N    O    P    Q
       722, 278, 556, 722, 611, 833, 722, 778, 667, 778,
    //   R    S    T    U    V    W    X    Y    Z    [
       722, 667, 611, 722, 667, 944, 667, 667, 611, 333,
    //   \    ]    ^    _    `    a    b    c    d    e
       278, 333, 584, 556, 333, 556, 611, 556, 611, 556,
    //   f    g    h    i    j    k    l    m    n    o
       333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    //   p    q    r    s    t    u    v    w    x    y
       611, 611, 389, 556, 333, 611, 556, 778, 556, 556,
    //   z    {    |    }    ~
       556, 389, 280, 389, 584,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFace {
    Helvetica,
    HelveticaBold,
}

impl FontFace {
    /// Key under which the face is registered in each page's resource
    /// dictionary.
    pub fn resource_name(self) -> Name<'static> {
        match self {
            FontFace::Helvetica => Name(b"F1"),
            FontFace::HelveticaBold => Name(b"F2"),
        }
    }

    /// PostScript name of the built-in font.
    pub fn base_font(self) -> Name<'static> {
        match self {
            FontFace::Helvetica => Name(b"Helvetica"),
            FontFace::HelveticaBold => Name(b"Helvetica-Bold"),
        }
    }

    fn widths(self) -> &'static [u16; 95] {
        match self {
            FontFace::Helvetica => &HELVETICA,
            FontFace::HelveticaBold => &HELVETICA_BOLD,
        }
    }

    pub(super) fn char_width(self, c: char) -> u16 {
        let widths = self.widths();
        match u32::from(c) {
            code @ 0x20..=0x7E => widths[(code - 0x20) as usize],
            _ => widths[(u32::from('?') - 0x20) as usize],
        }
    }

    /// Width of `text` in points at the given font size.
    pub fn text_width(self, text: &str, size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| u32::from(self.char_width(c))).sum();
        units as f32 * size / 1000.0
    }
}
