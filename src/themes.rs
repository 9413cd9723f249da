//! Catalog of puzzle theme keys.
//!
//! Keys are the tokens found in the dataset's `Themes` column.

/// Grouping used when listing themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ThemeCategory {
    Phases,
    Motifs,
    Advanced,
    Mates,
    SpecialMoves,
    Goals,
    Lengths,
    Origin,
}

impl ThemeCategory {
    pub const ALL: [ThemeCategory; 8] = [
        ThemeCategory::Phases,
        ThemeCategory::Motifs,
        ThemeCategory::Advanced,
        ThemeCategory::Mates,
        ThemeCategory::SpecialMoves,
        ThemeCategory::Goals,
        ThemeCategory::Lengths,
        ThemeCategory::Origin,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ThemeCategory::Phases => "Phases",
            ThemeCategory::Motifs => "Motifs",
            ThemeCategory::Advanced => "Advanced",
            ThemeCategory::Mates => "Mates",
            ThemeCategory::SpecialMoves => "Special moves",
            ThemeCategory::Goals => "Goals",
            ThemeCategory::Lengths => "Lengths",
            ThemeCategory::Origin => "Origin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PuzzleTheme {
    pub key: &'static str,
    pub name: &'static str,
    pub category: ThemeCategory,
    /// One-sentence explanation shown by the `themes` listing.
    pub description: &'static str,
}

const fn theme(
    key: &'static str,
    name: &'static str,
    category: ThemeCategory,
    description: &'static str,
) -> PuzzleTheme {
    PuzzleTheme {
        key,
        name,
        category,
        description,
    }
}

use ThemeCategory::*;

// `mate` is listed once under Mates even though it is also a goal.
static THEMES: &[PuzzleTheme] = &[
    theme(
        "opening",
        "Opening",
        Phases,
        "A tactic during the first phase of the game.",
    ),
    theme(
        "middlegame",
        "Middlegame",
        Phases,
        "A tactic during the second phase of the game.",
    ),
    theme(
        "endgame",
        "Endgame",
        Phases,
        "A tactic during the last phase of the game.",
    ),
    theme(
        "rookEndgame",
        "Rook endgame",
        Phases,
        "An endgame with only rooks and pawns.",
    ),
    theme(
        "bishopEndgame",
        "Bishop endgame",
        Phases,
        "An endgame with only bishops and pawns.",
    ),
    theme(
        "pawnEndgame",
        "Pawn endgame",
        Phases,
        "An endgame with only pawns.",
    ),
    theme(
        "knightEndgame",
        "Knight endgame",
        Phases,
        "An endgame with only knights and pawns.",
    ),
    theme(
        "queenEndgame",
        "Queen endgame",
        Phases,
        "An endgame with only queens and pawns.",
    ),
    theme(
        "queenRookEndgame",
        "Queen and Rook",
        Phases,
        "An endgame with only queens, rooks and pawns.",
    ),
    theme(
        "advancedPawn",
        "Advanced pawn",
        Motifs,
        "One of your pawns is deep into the opponent position, maybe threatening to promote.",
    ),
    theme(
        "attackingF2F7",
        "Attacking f2 or f7",
        Motifs,
        "An attack focusing on the f2 or f7 pawn, such as in the fried liver opening.",
    ),
    theme(
        "capturingDefender",
        "Capture the defender",
        Motifs,
        "Removing a piece that is critical to defence of another piece, allowing the now undefended piece to be captured on a following move.",
    ),
    theme(
        "discoveredAttack",
        "Discovered attack",
        Motifs,
        "Moving a piece (such as a knight), that previously blocked an attack by a long range piece (such as a rook), out of the way of that piece.",
    ),
    theme(
        "doubleCheck",
        "Double check",
        Motifs,
        "Checking with two pieces at once, as a result of a discovered attack where both the moving piece and the unveiled piece attack the opponent's king.",
    ),
    theme(
        "exposedKing",
        "Exposed king",
        Motifs,
        "A tactic involving a king with few defenders around it, often leading to checkmate.",
    ),
    theme(
        "fork",
        "Fork",
        Motifs,
        "A move where the moved piece attacks two opponent pieces at once.",
    ),
    theme(
        "hangingPiece",
        "Hanging piece",
        Motifs,
        "A tactic involving an opponent piece being undefended or insufficiently defended and free to capture.",
    ),
    theme(
        "kingsideAttack",
        "Kingside attack",
        Motifs,
        "An attack of the opponent's king, after they castled on the king side.",
    ),
    theme(
        "pin",
        "Pin",
        Motifs,
        "A tactic involving pins, where a piece is unable to move without revealing an attack on a higher value piece.",
    ),
    theme(
        "queensideAttack",
        "Queenside attack",
        Motifs,
        "An attack of the opponent's king, after they castled on the queen side.",
    ),
    theme(
        "sacrifice",
        "Sacrifice",
        Motifs,
        "A tactic involving giving up material in the short-term, to gain an advantage again after a forced sequence of moves.",
    ),
    theme(
        "skewer",
        "Skewer",
        Motifs,
        "A motif involving a high value piece being attacked, moving out the way, and allowing a lower value piece behind it to be captured or attacked, the inverse of a pin.",
    ),
    theme(
        "trappedPiece",
        "Trapped piece",
        Motifs,
        "A piece is unable to escape capture as it has limited moves.",
    ),
    theme(
        "attraction",
        "Attraction",
        Advanced,
        "An exchange or sacrifice encouraging or forcing an opponent piece to a square that allows a follow-up tactic.",
    ),
    theme(
        "clearance",
        "Clearance",
        Advanced,
        "A move, often with tempo, that clears a square, file or diagonal for a follow-up tactical idea.",
    ),
    theme(
        "defensiveMove",
        "Defensive move",
        Advanced,
        "A precise move or sequence of moves that is needed to avoid losing material or another advantage.",
    ),
    theme(
        "deflection",
        "Deflection",
        Advanced,
        "A move that distracts an opponent piece from another duty that it performs, such as guarding a key square. Sometimes also called \"overloading\".",
    ),
    theme(
        "interference",
        "Interference",
        Advanced,
        "Moving a piece between two opponent pieces to leave one or both opponent pieces undefended, such as a knight on a defended square between two rooks.",
    ),
    theme(
        "intermezzo",
        "Intermezzo",
        Advanced,
        "Instead of playing the expected move, first interpose another move posing an immediate threat that the opponent must answer. Also known as \"Zwischenzug\" or \"In between\".",
    ),
    theme(
        "quietMove",
        "Quiet move",
        Advanced,
        "A move that does neither make a check or capture, nor an immediate threat to capture, but does prepare a more hidden unavoidable threat for a later move.",
    ),
    theme(
        "xRayAttack",
        "X-Ray attack",
        Advanced,
        "A piece attacks or defends a square, through an enemy piece.",
    ),
    theme(
        "zugzwang",
        "Zugzwang",
        Advanced,
        "The opponent is limited in the moves they can make, and all moves worsen their position.",
    ),
    theme(
        "mate",
        "Checkmate",
        Mates,
        "Win the game with style.",
    ),
    theme(
        "mateIn1",
        "Mate in 1",
        Mates,
        "Deliver checkmate in one move.",
    ),
    theme(
        "mateIn2",
        "Mate in 2",
        Mates,
        "Deliver checkmate in two moves.",
    ),
    theme(
        "mateIn3",
        "Mate in 3",
        Mates,
        "Deliver checkmate in three moves.",
    ),
    theme(
        "mateIn4",
        "Mate in 4",
        Mates,
        "Deliver checkmate in four moves.",
    ),
    theme(
        "mateIn5",
        "Mate in 5 or more",
        Mates,
        "Figure out a long mating sequence.",
    ),
    theme(
        "anastasiaMate",
        "Anastasia's mate",
        Mates,
        "A knight and rook or queen team up to trap the opposing king between the side of the board and a friendly piece.",
    ),
    theme(
        "arabianMate",
        "Arabian mate",
        Mates,
        "A knight and a rook team up to trap the opposing king on a corner of the board.",
    ),
    theme(
        "backRankMate",
        "Back rank mate",
        Mates,
        "Checkmate the king on the home rank, when it is trapped there by its own pieces.",
    ),
    theme(
        "bodenMate",
        "Boden's mate",
        Mates,
        "Two attacking bishops on criss-crossing diagonals deliver mate to a king obstructed by friendly pieces.",
    ),
    theme(
        "doubleBishopMate",
        "Double bishop mate",
        Mates,
        "Two attacking bishops on adjacent diagonals deliver mate to a king obstructed by friendly pieces.",
    ),
    theme(
        "dovetailMate",
        "Dovetail mate",
        Mates,
        "A queen delivers mate to an adjacent king, whose only two escape squares are obstructed by friendly pieces.",
    ),
    theme(
        "hookMate",
        "Hook mate",
        Mates,
        "Checkmate with a rook, knight, and pawn along with one enemy pawn to limit the enemy king's escape.",
    ),
    theme(
        "killBoxMate",
        "Kill box mate",
        Mates,
        "A rook is next to the enemy king and supported by a queen that also blocks the king's escape squares. The rook and the queen catch the enemy king in a 3 by 3 \"kill box\".",
    ),
    theme(
        "vukovicMate",
        "Vukovic mate",
        Mates,
        "A rook and knight team up to mate the king. The rook delivers mate while supported by a third piece, and the knight is used to block the king's escape squares.",
    ),
    theme(
        "smotheredMate",
        "Smothered mate",
        Mates,
        "A checkmate delivered by a knight in which the mated king is unable to move because it is surrounded (or smothered) by its own pieces.",
    ),
    theme(
        "castling",
        "Castling",
        SpecialMoves,
        "Bring the king to safety, and deploy the rook for attack.",
    ),
    theme(
        "enPassant",
        "En passant",
        SpecialMoves,
        "A tactic involving the en passant rule, where a pawn can capture an opponent pawn that has bypassed it using its initial two-square move.",
    ),
    theme(
        "promotion",
        "Promotion",
        SpecialMoves,
        "Promote one of your pawn to a queen or minor piece.",
    ),
    theme(
        "underPromotion",
        "Underpromotion",
        SpecialMoves,
        "Promotion to a knight, bishop, or rook.",
    ),
    theme(
        "equality",
        "Equality",
        Goals,
        "Come back from a losing position, and secure a draw or a balanced position. (eval ≤ 200cp)",
    ),
    theme(
        "advantage",
        "Advantage",
        Goals,
        "Seize your chance to get a decisive advantage. (200cp ≤ eval ≤ 600cp)",
    ),
    theme(
        "crushing",
        "Crushing",
        Goals,
        "Spot the opponent blunder to obtain a crushing advantage. (eval ≥ 600cp)",
    ),
    theme(
        "oneMove",
        "One-move puzzle",
        Lengths,
        "A puzzle that is only one move long.",
    ),
    theme(
        "short",
        "Short puzzle",
        Lengths,
        "Two moves to win.",
    ),
    theme(
        "long",
        "Long puzzle",
        Lengths,
        "Three moves to win.",
    ),
    theme(
        "veryLong",
        "Very long puzzle",
        Lengths,
        "Four moves or more to win.",
    ),
    theme(
        "master",
        "Master games",
        Origin,
        "Puzzles from games played by titled players.",
    ),
    theme(
        "masterVsMaster",
        "Master vs Master games",
        Origin,
        "Puzzles from games between two titled players.",
    ),
    theme(
        "superGM",
        "Super GM games",
        Origin,
        "Puzzles from games played by the best players in the world.",
    ),
];

pub fn all() -> &'static [PuzzleTheme] {
    THEMES
}

pub fn lookup(key: &str) -> Option<&'static PuzzleTheme> {
    THEMES.iter().find(|t| t.key == key)
}

pub fn is_known(key: &str) -> bool {
    lookup(key).is_some()
}

/// Themes grouped by category, categories in display order.
pub fn by_category() -> Vec<(ThemeCategory, Vec<&'static PuzzleTheme>)> {
    ThemeCategory::ALL
        .iter()
        .map(|&cat| (cat, THEMES.iter().filter(|t| t.category == cat).collect()))
        .collect()
}
